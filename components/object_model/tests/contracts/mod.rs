//! Contract tests for object_model

mod api_contract;
