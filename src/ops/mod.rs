pub mod board_ops;
pub mod ordering;
pub mod subtask;
