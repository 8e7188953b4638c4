use std::backtrace::BacktraceStatus;

use anyhow::Error;
use simplelog::error;

pub struct FancyError();

impl FancyError {
    pub fn print_fancy(error: &Error, critical: bool) {
        if critical {
            error!("The panel hit an error it cannot continue after.");
        } else {
            error!("The panel hit an error but can continue. Some operations may not work as expected.");
        }

        error!("Error: {}", error);
        error
            .chain()
            .skip(1)
            .for_each(|cause| error!("    Caused by: {}", cause));

        match error.backtrace().status() {
            BacktraceStatus::Captured => {
                error!("Backtrace:");
                format!("{}", error.backtrace())
                    .lines()
                    .for_each(|line| error!("{}", line));
            }
            _ => {
                error!("Run with `RUST_BACKTRACE=1` to capture a backtrace.");
            }
        }
    }
}
