pub use self::unix::write_all_raw;

pub mod unix;
