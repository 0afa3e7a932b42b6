//! relax - dev server for server-rendered components with live view updates.

use anyhow::Result;

fn main() -> Result<()> {
    relax::App::new().run()
}
