use anyhow::Context;
use booklist_app::app::{self, StoreBackend};
use booklist_kernel::settings::Settings;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load().with_context(|| "failed to load booklist settings")?;

    booklist_telemetry::init(&settings.telemetry)?;

    app::serve(settings, StoreBackend::Mongo).await
}
