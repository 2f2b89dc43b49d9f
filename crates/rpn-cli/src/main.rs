fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    rpn_cli::run()
}
