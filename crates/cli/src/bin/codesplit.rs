use anyhow::Result;

fn main() -> Result<()> {
    codesplit_cli::main_entry()
}
