fn main() -> anyhow::Result<()> {
    lookalike_lib::run()
}
