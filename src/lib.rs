pub mod app_error;
pub mod build_log;
pub mod cli;
pub mod config;
pub mod error;
pub mod model;
pub mod output;
pub mod paging;
pub mod range;
pub mod retention;
pub mod summary;
pub mod version;

pub fn run() -> i32 {
    match cli::run_cli() {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{err}");
            err.code()
        }
    }
}
