//! Dispatch macro mapping a lexer basic-opcode token to the parser's
//! `BasicOp` enum. DCPU-16's fifteen basic mnemonics all share one
//! two-operand grammar (unlike the model project's operate/PC-relative/
//! base-offset split), so the thing worth factoring out is this
//! token-to-opcode table rather than a family of shape-specific parse
//! functions.
macro_rules! basic_op_from_token {
    ($kind:expr) => {
        match $kind {
            TokenKind::OpSet => crate::parser::ast::BasicOp::Set,
            TokenKind::OpAdd => crate::parser::ast::BasicOp::Add,
            TokenKind::OpSub => crate::parser::ast::BasicOp::Sub,
            TokenKind::OpMul => crate::parser::ast::BasicOp::Mul,
            TokenKind::OpDiv => crate::parser::ast::BasicOp::Div,
            TokenKind::OpMod => crate::parser::ast::BasicOp::Mod,
            TokenKind::OpShl => crate::parser::ast::BasicOp::Shl,
            TokenKind::OpShr => crate::parser::ast::BasicOp::Shr,
            TokenKind::OpAnd => crate::parser::ast::BasicOp::And,
            TokenKind::OpBor => crate::parser::ast::BasicOp::Bor,
            TokenKind::OpXor => crate::parser::ast::BasicOp::Xor,
            TokenKind::OpIfe => crate::parser::ast::BasicOp::Ife,
            TokenKind::OpIfn => crate::parser::ast::BasicOp::Ifn,
            TokenKind::OpIfg => crate::parser::ast::BasicOp::Ifg,
            TokenKind::OpIfb => crate::parser::ast::BasicOp::Ifb,
            _ => unreachable!("not a basic opcode token"),
        }
    };
}
