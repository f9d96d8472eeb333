pub mod auth_fields;
pub mod client_context;
pub mod connect_options;
pub mod execution_result;
pub mod option_part;
pub mod option_value;
pub mod output_parameters;
pub mod parameter_descriptor;
pub mod parameters;
pub mod read_lob;
pub mod resultset;
pub mod resultset_metadata;
pub mod row;
pub mod server_error;
pub mod statement_context;
pub mod topology;
pub mod transaction_flags;
pub mod type_code;
pub mod value;
pub mod write_lob;
