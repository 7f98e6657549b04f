pub mod flow_list_table;
pub mod row_controls;
