mod books;
mod users;

use books::books;
use env_logger::Env;
use keel::Executor;
use users::users;

/// Test logger printing file and line, at `warn` unless `RUST_LOG` is set.
pub fn init_logs() {
    let _ = env_logger::Builder::from_env(Env::default().default_filter_or("warn"))
        .is_test(true)
        .format_file(true)
        .format_line_number(true)
        .try_init();
}

/// Runs every scenario against `executor`. Each scenario drops and recreates
/// its own tables.
pub async fn execute_tests<E: Executor>(executor: &E) {
    users(executor).await;
    books(executor).await;
}

/// Evaluates the block with logging turned off, for statements expected to fail.
#[macro_export]
macro_rules! silent_logs {
    ($($code:tt)+) => {{
        let previous = ::log::max_level();
        ::log::set_max_level(::log::LevelFilter::Off);
        let result = { $($code)+ };
        ::log::set_max_level(previous);
        result
    }};
}
