mod application;
mod presentation;

use revpk_core::error::Result;

fn main() -> Result<()> {
    application::run()
}
