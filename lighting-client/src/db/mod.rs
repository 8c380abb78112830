pub mod energy_record_queries;
pub mod role_queries;
