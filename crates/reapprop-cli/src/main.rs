fn main() -> anyhow::Result<()> {
    reapprop_cli::run(std::env::args())
}
