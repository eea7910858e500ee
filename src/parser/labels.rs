//! # Label table
//!
//! Labels may be referenced before they are defined, so every operand
//! that names a label holds a shared, mutable handle rather than a plain
//! string or an index into a side table: once the defining line is
//! parsed, every operand built earlier observes the update through the
//! same `Rc<RefCell<_>>`.
//!
//! The table itself keeps the insertion-ordered `Vec` lookup style used
//! elsewhere in this codebase for small, append-mostly collections —
//! linear scan is fine for the handful of labels a DCPU-16 program
//! typically defines.

use std::cell::RefCell;
use std::rc::Rc;

#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub name: String,
    pub pc: u16,
    pub defined: bool,
}

pub type LabelHandle = Rc<RefCell<Label>>;

#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    entries: Vec<LabelHandle>,
}

impl LabelTable {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Returns the existing handle for `name`, or creates a fresh
    /// undefined one. Used both for label definitions and references —
    /// whichever is seen first creates the entry.
    pub fn lookup_or_create(&mut self, name: &str) -> LabelHandle {
        if let Some(handle) = self.entries.iter().find(|h| h.borrow().name == name) {
            return Rc::clone(handle);
        }
        let handle = Rc::new(RefCell::new(Label {
            name: name.to_string(),
            pc: 0,
            defined: false,
        }));
        self.entries.push(Rc::clone(&handle));
        handle
    }

    /// Marks `name` as defined at `pc`. Returns the previous pc if the
    /// label was already defined, so the caller can raise a redefinition
    /// error naming both addresses.
    pub fn define(&mut self, name: &str, pc: u16) -> Result<(), u16> {
        let handle = self.lookup_or_create(name);
        let mut label = handle.borrow_mut();
        if label.defined {
            return Err(label.pc);
        }
        label.pc = pc;
        label.defined = true;
        Ok(())
    }

    /// Names of every label that was referenced but never defined, in
    /// first-reference order.
    pub fn undefined(&self) -> Vec<String> {
        self.entries
            .iter()
            .filter(|h| !h.borrow().defined)
            .map(|h| h.borrow().name.clone())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
