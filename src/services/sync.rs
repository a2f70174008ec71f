use serde::Serialize;

use crate::clients::currency_catalog::CurrencyCatalogClient;
use crate::clients::hr_directory::HrDirectoryClient;
use crate::db::Store;

/// Outcome of one caller-initiated sync run. Partial failure is normal
/// for these upstreams and is reported per sub-operation, never hidden.
#[derive(Debug, Default, Serialize)]
pub struct SyncReport {
    pub fetched: usize,
    pub created: usize,
    pub updated: usize,
    pub failures: Vec<SyncFailure>,
}

#[derive(Debug, Serialize)]
pub struct SyncFailure {
    pub scope: String,
    pub error: String,
}

/// Sweep the HR directory a–z and upsert every employee as a user
/// account. Idempotent: re-running converges to the same set.
pub async fn sync_employees(
    store: &Store,
    client: &HrDirectoryClient,
    actor: i32,
) -> SyncReport {
    let mut report = SyncReport::default();
    let users = store.users();

    for letter in 'a'..='z' {
        let employees = match client.fetch_by_initial(letter).await {
            Ok(list) => list,
            Err(e) => {
                tracing::warn!("HR sync failed for '{letter}': {e:#}");
                report.failures.push(SyncFailure {
                    scope: format!("letter:{letter}"),
                    error: format!("{e:#}"),
                });
                continue;
            }
        };

        report.fetched += employees.len();

        for employee in employees {
            match users
                .upsert_directory_entry(
                    &employee.username,
                    &employee.name,
                    employee.email.as_deref(),
                    actor,
                )
                .await
            {
                Ok(true) => report.created += 1,
                Ok(false) => report.updated += 1,
                Err(e) => report.failures.push(SyncFailure {
                    scope: format!("employee:{}", employee.username),
                    error: format!("{e:#}"),
                }),
            }
        }
    }

    tracing::info!(
        "HR sync done: {} fetched, {} created, {} updated, {} failures",
        report.fetched,
        report.created,
        report.updated,
        report.failures.len()
    );
    report
}

/// Fetch the complete currency catalog and upsert it by code.
pub async fn sync_currencies(
    store: &Store,
    client: &CurrencyCatalogClient,
    actor: i32,
) -> SyncReport {
    let mut report = SyncReport::default();
    let currencies = store.currencies();

    let catalog = match client.fetch_all().await {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!("Currency sync failed: {e:#}");
            report.failures.push(SyncFailure {
                scope: "catalog".to_string(),
                error: format!("{e:#}"),
            });
            return report;
        }
    };

    report.fetched = catalog.len();

    for currency in catalog {
        let existed = match currencies.get_by_code(&currency.code).await {
            Ok(row) => row.is_some(),
            Err(e) => {
                report.failures.push(SyncFailure {
                    scope: format!("currency:{}", currency.code),
                    error: format!("{e:#}"),
                });
                continue;
            }
        };

        match currencies
            .upsert_by_code(currency.code.clone(), currency.name, currency.symbol, actor)
            .await
        {
            Ok(_) if existed => report.updated += 1,
            Ok(_) => report.created += 1,
            Err(e) => report.failures.push(SyncFailure {
                scope: format!("currency:{}", currency.code),
                error: format!("{e:#}"),
            }),
        }
    }

    tracing::info!(
        "Currency sync done: {} fetched, {} created, {} updated, {} failures",
        report.fetched,
        report.created,
        report.updated,
        report.failures.len()
    );
    report
}
