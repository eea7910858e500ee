#[cfg(test)]
mod parser_tests {
    use crate::error::ErrorKind;
    use crate::lexer::tokenize;
    use crate::parser::ast::{Addressing, BasicOp, DatItem, LineContent, Opcode, Operand, RegisterOperand};
    use crate::parser::parse_program;

    fn parse(src: &str) -> crate::parser::ParseResult {
        let lexed = tokenize(src);
        assert!(lexed.errors.is_empty(), "lex errors: {:?}", lexed.errors);
        parse_program(&lexed.tokens, false)
    }

    #[test]
    fn empty_program() {
        let result = parse("");
        assert!(result.errors.is_empty());
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].content, LineContent::Empty);
    }

    #[test]
    fn simple_set_immediate() {
        let result = parse("SET A, 0x1e\n");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        match &result.lines[0].content {
            LineContent::Instruction(instr) => {
                assert_eq!(instr.pc, 0);
                assert_eq!(instr.op, Opcode::Basic(BasicOp::Set));
                assert_eq!(
                    instr.a,
                    Operand::Register(RegisterOperand::General(0), Addressing::Immediate)
                );
                assert_eq!(instr.b, Some(Operand::Literal(0x1e, Addressing::Immediate)));
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn pc_advances_by_next_word_count() {
        let result = parse("SET A, 0x1234\nSET B, 0x1\n");
        assert!(result.errors.is_empty());
        let second = result
            .lines
            .iter()
            .filter_map(|l| match &l.content {
                LineContent::Instruction(i) => Some(i),
                _ => None,
            })
            .nth(1)
            .unwrap();
        // First SET used a next word (0x1234 > 0x1f), so pc advances by 2.
        assert_eq!(second.pc, 2);
    }

    #[test]
    fn small_literal_does_not_use_next_word() {
        let result = parse("SET A, 0x1e\nSET B, 0x1\n");
        assert!(result.errors.is_empty());
        let instrs: Vec<_> = result
            .lines
            .iter()
            .filter_map(|l| match &l.content {
                LineContent::Instruction(i) => Some(i),
                _ => None,
            })
            .collect();
        assert_eq!(instrs[0].pc, 0);
        assert_eq!(instrs[1].pc, 1);
    }

    #[test]
    fn jsr_is_single_operand() {
        let result = parse("JSR foo\n");
        assert!(result.errors.is_empty());
        match &result.lines[0].content {
            LineContent::Instruction(instr) => {
                assert_eq!(instr.op, Opcode::NonBasic(crate::parser::ast::NonBasicOp::Jsr));
                assert!(instr.b.is_none());
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn jsr_with_two_operands_is_an_error() {
        let result = parse("JSR foo, bar\n");
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors[0].kind, ErrorKind::TooManyOperands);
    }

    #[test]
    fn forward_label_reference_resolves() {
        let result = parse(":start SET A, 1\nSET PC, start\n");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        let start = result.labels.lookup_or_create("start");
        assert!(start.borrow().defined);
        assert_eq!(start.borrow().pc, 0);
    }

    #[test]
    fn undefined_label_is_tracked() {
        let result = parse("SET PC, nowhere\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.labels.undefined(), vec!["nowhere".to_string()]);
    }

    #[test]
    fn duplicate_label_is_an_error() {
        let result = parse(":a SET A, 1\n:a SET A, 2\n");
        assert_eq!(result.errors.len(), 1);
        assert_eq!(result.errors[0].kind, ErrorKind::DuplicateLabel);
    }

    #[test]
    fn multiple_labels_same_line() {
        let result = parse(":a :b SET A, 1\n");
        assert!(result.errors.is_empty());
        assert_eq!(result.lines[0].labels.len(), 2);
    }

    #[test]
    fn org_sets_pc() {
        let result = parse(".ORG 0x200\nSET A, 1\n");
        assert!(result.errors.is_empty());
        let instr = result
            .lines
            .iter()
            .find_map(|l| match &l.content {
                LineContent::Instruction(i) => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(instr.pc, 0x200);
    }

    #[test]
    fn bare_directives_accepted() {
        let result = parse("ORG 0x10\nDAT 1, 2, 3\n");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
    }

    #[test]
    fn dat_word_items() {
        let result = parse(".DAT 1, 2, 3\n");
        assert!(result.errors.is_empty());
        match &result.lines[0].content {
            LineContent::Dat { pc, items } => {
                assert_eq!(*pc, 0);
                assert_eq!(
                    items,
                    &vec![DatItem::Word(1), DatItem::Word(2), DatItem::Word(3)]
                );
            }
            other => panic!("expected dat, got {other:?}"),
        }
    }

    #[test]
    fn dat_string_item_advances_pc_per_char() {
        let result = parse(".DAT \"Hi\"\nSET A, 1\n");
        assert!(result.errors.is_empty());
        let instr = result
            .lines
            .iter()
            .find_map(|l| match &l.content {
                LineContent::Instruction(i) => Some(i),
                _ => None,
            })
            .unwrap();
        assert_eq!(instr.pc, 2);
    }

    #[test]
    fn register_offset_operand() {
        let result = parse("SET [A+1], B\n");
        assert!(result.errors.is_empty(), "{:?}", result.errors);
        match &result.lines[0].content {
            LineContent::Instruction(instr) => match &instr.a {
                Operand::RegisterOffset { base, .. } => assert_eq!(*base, 0),
                other => panic!("expected register offset, got {other:?}"),
            },
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn bracketed_register_is_reference() {
        let result = parse("SET [A], B\n");
        assert!(result.errors.is_empty());
        match &result.lines[0].content {
            LineContent::Instruction(instr) => {
                assert_eq!(
                    instr.a,
                    Operand::Register(RegisterOperand::General(0), Addressing::Reference)
                );
            }
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn stack_pseudo_register_operand() {
        let result = parse("SET A, POP\nSET PUSH, A\n");
        assert!(result.errors.is_empty());
    }

    #[test]
    fn missing_second_operand_is_error() {
        let result = parse("SET A\n");
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors[0].kind, ErrorKind::TooFewOperands);
    }

    #[test]
    fn invalid_bracket_contents() {
        let result = parse("SET [POP], A\n");
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors[0].kind, ErrorKind::InvalidOperandShape);
    }

    #[test]
    fn missing_close_bracket() {
        let result = parse("SET [A, B\n");
        assert!(!result.errors.is_empty());
        assert_eq!(result.errors[0].kind, ErrorKind::ExpectedCloseBracket);
    }

    #[test]
    fn org_backward_warns_in_paranoid_mode() {
        let lexed = tokenize(".ORG 0x10\nSET A, 1\n.ORG 0x5\n");
        let result = parse_program(&lexed.tokens, true);
        assert!(result.errors.is_empty());
        assert_eq!(result.warnings.len(), 1);
    }

    #[test]
    fn org_backward_silent_without_paranoid() {
        let lexed = tokenize(".ORG 0x10\nSET A, 1\n.ORG 0x5\n");
        let result = parse_program(&lexed.tokens, false);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }
}
