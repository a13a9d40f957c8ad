//! Structural verification of compiled fragments
//!
//! Catches malformed instruction streams before the engine runs them: jump
//! targets outside the block, constant or nested-template indices out of
//! range, name operands that are not strings, and local or static slots the
//! frame does not have. Nested templates are checked recursively.

use core_types::{ScriptError, SourcePosition};

use crate::block::InstructionBlock;
use crate::opcode::Opcode;
use crate::template::{CompiledFragment, FunctionTemplate};

/// Verifier for compiled fragments
pub struct Verifier {
    /// Number of static slots available to the fragment being checked
    static_count: usize,
    /// Maximum nesting depth of function literals
    max_depth: usize,
}

impl Verifier {
    /// Create a verifier for a fragment with `static_count` static slots
    pub fn new(static_count: usize) -> Self {
        Self {
            static_count,
            max_depth: 64,
        }
    }

    /// Set maximum nesting depth of function literals
    pub fn with_max_depth(mut self, max: usize) -> Self {
        self.max_depth = max;
        self
    }

    /// Verify a whole fragment
    ///
    /// ```
    /// use bytecode_system::{Arity, CompiledFragment, FunctionTemplate, InstructionBlock, Opcode, Verifier};
    ///
    /// let mut block = InstructionBlock::new();
    /// block.emit(Opcode::Jump(10));
    /// let fragment = CompiledFragment::new("bad", FunctionTemplate::new(None, block, Arity::fixed(0)));
    ///
    /// assert!(Verifier::verify_fragment(&fragment).is_err());
    /// ```
    pub fn verify_fragment(fragment: &CompiledFragment) -> Result<(), ScriptError> {
        Verifier::new(fragment.static_names.len()).verify(&fragment.main)
    }

    /// Verify a template and its nested templates
    pub fn verify(&self, template: &FunctionTemplate) -> Result<(), ScriptError> {
        self.verify_at_depth(template, 0)
    }

    fn verify_at_depth(&self, template: &FunctionTemplate, depth: usize) -> Result<(), ScriptError> {
        if depth > self.max_depth {
            return Err(ScriptError::internal(format!(
                "function literals nested deeper than {}",
                self.max_depth
            )));
        }
        template.arity.validate().map_err(|msg| {
            ScriptError::internal(format!("{}: {}", template.display_name(), msg))
                .with_position(SourcePosition::line(template.line))
        })?;

        self.verify_block(template, &template.block)?;

        for nested in &template.block.nested_functions {
            self.verify_at_depth(nested, depth + 1)?;
        }
        Ok(())
    }

    fn verify_block(&self, template: &FunctionTemplate, block: &InstructionBlock) -> Result<(), ScriptError> {
        let len = block.instructions.len();
        let frame_size = template.frame_size();

        for (offset, inst) in block.instructions.iter().enumerate() {
            let fail = |msg: String| {
                let error = ScriptError::internal(format!(
                    "{} @{}: {}",
                    template.display_name(),
                    offset,
                    msg
                ));
                match inst.source_position {
                    Some(pos) => error.with_position(pos),
                    None => error,
                }
            };

            // A jump to `len` falls off the end, which is an implicit return.
            if let Some(target) = inst.opcode.jump_target() {
                if target > len {
                    return Err(fail(format!("jump target {} outside block of {}", target, len)));
                }
            }

            if let Some(idx) = inst.opcode.name_operand() {
                if block.name_at(idx).is_none() {
                    return Err(fail(format!("constant {} is not a name", idx)));
                }
            }

            match &inst.opcode {
                Opcode::PushConstant(idx) if *idx >= block.constants.len() => {
                    return Err(fail(format!("constant {} out of range", idx)));
                }
                Opcode::LoadLocal(id) | Opcode::StoreLocal(id) if id.0 as usize >= frame_size => {
                    return Err(fail(format!("local {} outside frame of {}", id.0, frame_size)));
                }
                Opcode::LoadStatic(slot) | Opcode::StoreStatic(slot)
                    if *slot as usize >= self.static_count =>
                {
                    return Err(fail(format!("static slot {} not declared", slot)));
                }
                Opcode::JumpIfStaticInitialized { slot, .. } if *slot as usize >= self.static_count => {
                    return Err(fail(format!("static slot {} not declared", slot)));
                }
                Opcode::JumpIfArgumentSupplied { param, .. }
                    if *param as usize >= template.arity.param_count =>
                {
                    return Err(fail(format!("parameter {} not declared", param)));
                }
                Opcode::CreateClosure(idx) if *idx >= block.nested_functions.len() => {
                    return Err(fail(format!("nested function {} out of range", idx)));
                }
                _ => {}
            }
        }
        Ok(())
    }
}

impl Default for Verifier {
    fn default() -> Self {
        Self::new(0)
    }
}
