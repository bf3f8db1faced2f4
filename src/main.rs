fn main() -> anyhow::Result<()> {
    ai_dj_lib::run()
}
