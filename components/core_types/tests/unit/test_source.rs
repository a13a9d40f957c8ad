//! Unit tests for SourcePosition and StackFrame

use core_types::{SourcePosition, StackFrame};

#[cfg(test)]
mod source_position_tests {
    use super::*;

    #[test]
    fn test_source_position_large_values() {
        let pos = SourcePosition::new(u32::MAX, u32::MAX);
        assert_eq!(pos.line, u32::MAX);
        assert_eq!(pos.column, u32::MAX);
    }

    #[test]
    fn test_source_position_equality() {
        assert_eq!(SourcePosition::new(4, 2), SourcePosition::new(4, 2));
        assert_ne!(SourcePosition::new(4, 2), SourcePosition::new(4, 3));
    }

    #[test]
    fn test_source_position_is_copy() {
        let pos = SourcePosition::line(8);
        let copy = pos;
        assert_eq!(pos, copy);
    }
}

#[cfg(test)]
mod stack_frame_tests {
    use super::*;

    #[test]
    fn test_stack_frame_display_with_source() {
        let frame = StackFrame {
            function_name: Some("step".to_string()),
            source_url: Some("main.escript".to_string()),
            line: 3,
        };
        assert_eq!(frame.to_string(), "step (main.escript:3)");
    }

    #[test]
    fn test_stack_frame_display_without_source() {
        let frame = StackFrame {
            function_name: Some("step".to_string()),
            source_url: None,
            line: 3,
        };
        assert_eq!(frame.to_string(), "step (line 3)");
    }

    #[test]
    fn test_stack_frame_clone() {
        let frame = StackFrame {
            function_name: None,
            source_url: None,
            line: 42,
        };
        assert_eq!(frame.clone(), frame);
    }
}
