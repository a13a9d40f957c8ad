//! Contract tests for bytecode_system
