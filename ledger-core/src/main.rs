use ledger_core::{ApiResponse, JsonFileStore, Ledger, setup_environment};

fn main() -> anyhow::Result<()> {
    // 1. Environment (.env, config, logging)
    let config = setup_environment()?;
    tracing::info!(
        data_dir = %config.data_dir,
        environment = %config.environment,
        "Ledger report starting"
    );

    // 2. Load the ledger and build the report
    let today = shared::util::today();
    let store = JsonFileStore::new(&config.data_dir);
    let result = Ledger::open(&store, config)
        .map(|ledger| ledger.view().report(today))
        .inspect_err(|e| {
            tracing::error!(
                code = %e.code,
                category = e.code.category().name(),
                error = %e,
                "Failed to open ledger"
            )
        });

    // 3. Print
    println!("{}", serde_json::to_string_pretty(&ApiResponse::from_result(result))?);
    Ok(())
}
