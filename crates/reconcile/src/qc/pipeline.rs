use super::detect::detect;
use super::fix::{FixOutcome, plan_fixes};
use super::issues::QcIssue;
use super::locks::CaptureLocks;
use super::validate::{ValidationReport, validate};
use crate::cache::PositionCache;
use crate::error::EngineResult;
use lpscope_data::{PositionQuery, PositionStore, RetryPolicy};
use lpscope_domain::{CanonicalKey, CaptureId};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{error, info, warn};

/// Outcome of one sweep.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QcReport {
    pub capture_id: CaptureId,
    pub validation: ValidationReport,
    /// Stage 1 failed and nothing else ran.
    pub aborted: bool,
    pub positions_checked: usize,
    pub issues_found: Vec<QcIssue>,
    pub fixes: Vec<FixOutcome>,
    /// Issues still present after the verify stage.
    pub remaining_issues: Vec<QcIssue>,
    /// No auto-fixable issue remains.
    pub success: bool,
}

impl QcReport {
    fn aborted(capture_id: CaptureId, validation: ValidationReport) -> Self {
        Self {
            capture_id,
            validation,
            aborted: true,
            positions_checked: 0,
            issues_found: Vec::new(),
            fixes: Vec::new(),
            remaining_issues: Vec::new(),
            success: false,
        }
    }

    /// Fixes that were persisted.
    pub fn fixes_applied(&self) -> usize {
        self.fixes.iter().filter(|f| f.persisted).count()
    }

    /// Fixes whose update failed.
    pub fn fixes_failed(&self) -> usize {
        self.fixes.len() - self.fixes_applied()
    }
}

/// Sweep driver.
pub struct QualityControl {
    store: Arc<dyn PositionStore>,
    cache: Arc<PositionCache>,
    retry: RetryPolicy,
    locks: CaptureLocks,
}

impl QualityControl {
    pub fn new(store: Arc<dyn PositionStore>, cache: Arc<PositionCache>, retry: RetryPolicy) -> Self {
        Self {
            store,
            cache,
            retry,
            locks: CaptureLocks::new(),
        }
    }

    /// Runs the four stages for `capture_id`.
    ///
    /// Sweeps of the same capture are serialized. A capture that is missing,
    /// fails to load, or fails validation yields an aborted report. A fix
    /// that cannot be persisted is recorded and the sweep carries on.
    ///
    /// # Errors
    /// Returns the store error when loading the capture fails transiently
    /// after retries, or when the capture's positions cannot be read.
    pub async fn run(&self, capture_id: CaptureId) -> EngineResult<QcReport> {
        let _guard = self.locks.acquire(capture_id).await;

        // Stage 1
        let loaded = self
            .retry
            .run("find_capture", || self.store.find_capture(capture_id))
            .await;
        let capture = match loaded {
            Ok(Some(capture)) => capture,
            Ok(None) => {
                error!(capture_id = %capture_id, "QC sweep aborted, capture not found");
                return Ok(QcReport::aborted(
                    capture_id,
                    ValidationReport::hard_error("capture", "capture not found"),
                ));
            }
            Err(err) if err.is_transient() => return Err(err.into()),
            Err(err) => {
                error!(capture_id = %capture_id, error = %err, "QC sweep aborted, capture unreadable");
                return Ok(QcReport::aborted(
                    capture_id,
                    ValidationReport::hard_error("capture", format!("capture could not be loaded: {err}")),
                ));
            }
        };

        let validation = validate(&capture);
        if !validation.is_valid() {
            error!(
                capture_id = %capture_id,
                errors = validation.errors.len(),
                "QC sweep aborted, capture failed validation"
            );
            return Ok(QcReport::aborted(capture_id, validation));
        }

        // Stage 2
        let query = PositionQuery::for_capture(capture_id);
        let positions = self
            .retry
            .run("select_positions", || self.store.select_positions(&query))
            .await?;
        let issues_found = detect(&positions);

        // Stage 3
        let fixes = plan_fixes(&issues_found, &positions);
        let mut outcomes = Vec::with_capacity(fixes.len());
        let mut touched: BTreeSet<CanonicalKey> = BTreeSet::new();

        for fix in fixes {
            let result = self
                .retry
                .run("update_position", || {
                    self.store.update_position(fix.position.id, &fix.patch)
                })
                .await;

            let outcome = match result {
                Ok(true) => {
                    touched.insert(fix.position.key.clone());
                    FixOutcome {
                        fix,
                        persisted: true,
                        error: None,
                    }
                }
                Ok(false) => {
                    warn!(row = %fix.position.id, issue = %fix.issue_type, "Fix target no longer exists");
                    FixOutcome {
                        fix,
                        persisted: false,
                        error: Some("row no longer exists".to_string()),
                    }
                }
                Err(err) => {
                    warn!(row = %fix.position.id, issue = %fix.issue_type, error = %err, "Failed to persist fix");
                    FixOutcome {
                        fix,
                        persisted: false,
                        error: Some(err.to_string()),
                    }
                }
            };
            outcomes.push(outcome);
        }

        for key in &touched {
            self.cache.invalidate(key).await;
        }

        // Stage 4
        let verified = self
            .retry
            .run("select_positions", || self.store.select_positions(&query))
            .await?;
        let remaining_issues = detect(&verified);
        let success = remaining_issues.iter().all(|issue| !issue.auto_fixable);

        let report = QcReport {
            capture_id,
            validation,
            aborted: false,
            positions_checked: positions.len(),
            issues_found,
            fixes: outcomes,
            remaining_issues,
            success,
        };

        info!(
            capture_id = %capture_id,
            positions = report.positions_checked,
            issues = report.issues_found.len(),
            fixed = report.fixes_applied(),
            failed = report.fixes_failed(),
            remaining = report.remaining_issues.len(),
            success = report.success,
            "QC sweep finished"
        );

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CacheConfig;
    use crate::qc::IssueType;
    use crate::test_support::{
        FlakyStore, capture, complete_fields, fast_retry, key, obs, seed, stored, ts,
    };
    use lpscope_data::MemoryStore;
    use lpscope_domain::{Capture, FixedClock, PositionFields};
    use rust_decimal_macros::dec;

    fn sweep_over(store: Arc<dyn PositionStore>) -> (QualityControl, Arc<PositionCache>) {
        let cache = Arc::new(PositionCache::new(
            Arc::clone(&store),
            Arc::new(FixedClock::new(ts(0))),
            CacheConfig::default(),
            fast_retry(),
        ));
        let qc = QualityControl::new(store, Arc::clone(&cache), fast_retry());
        (qc, cache)
    }

    fn skewed_percentages() -> PositionFields {
        PositionFields {
            token0_percentage: Some(dec!(60)),
            token1_percentage: Some(dec!(45)),
            ..complete_fields()
        }
    }

    #[tokio::test]
    async fn test_sweep_fixes_percentages() {
        let store = Arc::new(MemoryStore::new());
        let cap = capture("orca");
        seed(
            store.as_ref(),
            &cap,
            vec![stored(
                "orca",
                "SOL/USDC",
                obs("orca", "SOL/USDC", ts(0))
                    .with_tokens("SOL", "USDC")
                    .with_fields(skewed_percentages()),
            )],
        )
        .await;
        let (qc, cache) = sweep_over(store);
        let sol = key("orca", "SOL/USDC");
        cache.get(&sol).await.unwrap();

        let report = qc.run(cap.id).await.unwrap();
        assert!(report.success);
        assert!(!report.aborted);
        assert_eq!(report.positions_checked, 1);
        assert_eq!(report.issues_found[0].issue_type, IssueType::InvalidPercentages);
        assert_eq!(report.fixes_applied(), 1);
        assert!(report.remaining_issues.is_empty());

        let record = cache.get(&sol).await.unwrap().unwrap();
        assert_eq!(record.position.fields().token0_percentage, Some(dec!(60.0)));
        assert_eq!(record.position.fields().token1_percentage, Some(dec!(40.0)));
        assert_eq!(cache.stats().await.rebuilds, 2);
    }

    #[tokio::test]
    async fn test_report_only_issues_do_not_fail_sweep() {
        let store = Arc::new(MemoryStore::new());
        let cap = capture("orca");
        let mut fields = complete_fields();
        fields.balance = Some(dec!(1500));
        seed(
            store.as_ref(),
            &cap,
            vec![stored(
                "orca",
                "SOL/USDC",
                obs("orca", "SOL/USDC", ts(0)).with_tokens("SOL", "USDC").with_fields(fields),
            )],
        )
        .await;
        let (qc, _) = sweep_over(store);

        let report = qc.run(cap.id).await.unwrap();
        assert!(report.success);
        assert!(report.fixes.is_empty());
        assert_eq!(report.remaining_issues.len(), 1);
        assert_eq!(report.remaining_issues[0].issue_type, IssueType::BalanceMismatch);
    }

    #[tokio::test]
    async fn test_unnameable_pair_fails_sweep() {
        let store = Arc::new(MemoryStore::new());
        let cap = capture("orca");
        seed(
            store.as_ref(),
            &cap,
            vec![stored("orca", "SOL/", obs("orca", "SOL/", ts(0)))],
        )
        .await;
        let (qc, _) = sweep_over(store);

        let report = qc.run(cap.id).await.unwrap();
        assert!(!report.success);
        assert!(report.fixes.is_empty());
        assert_eq!(report.remaining_issues.len(), 1);
        assert_eq!(report.remaining_issues[0].issue_type, IssueType::MissingTokenNames);
        assert!(report.remaining_issues[0].auto_fixable);
    }

    #[tokio::test]
    async fn test_missing_capture_aborts() {
        let (qc, _) = sweep_over(Arc::new(MemoryStore::new()));
        let report = qc.run(CaptureId::new()).await.unwrap();
        assert!(report.aborted);
        assert!(!report.success);
        assert_eq!(report.validation.errors[0].field, "capture");
    }

    #[tokio::test]
    async fn test_invalid_capture_aborts_before_detection() {
        let store = Arc::new(MemoryStore::new());
        let cap = Capture {
            content: None,
            ..capture("orca")
        };
        seed(
            store.as_ref(),
            &cap,
            vec![stored("orca", "SOL/USDC", obs("orca", "SOL/USDC0", ts(0)))],
        )
        .await;
        let (qc, _) = sweep_over(store);

        let report = qc.run(cap.id).await.unwrap();
        assert!(report.aborted);
        assert_eq!(report.positions_checked, 0);
        assert_eq!(report.validation.errors[0].field, "content");
    }

    #[tokio::test]
    async fn test_failed_fix_is_reported() {
        let store = Arc::new(FlakyStore::new());
        let cap = capture("orca");
        let rows = seed(
            store.as_ref(),
            &cap,
            vec![
                stored("orca", "SOL/USDC", obs("orca", "SOL/USDC0", ts(0))),
                stored("orca", "RAY/USDC", obs("orca", "RAY/USDC", ts(0))),
            ],
        )
        .await;
        store.fail_update(rows[0].id);
        let (qc, _) = sweep_over(store);

        let report = qc.run(cap.id).await.unwrap();
        assert_eq!(report.fixes.len(), 2);
        assert_eq!(report.fixes_applied(), 1);
        assert_eq!(report.fixes_failed(), 1);
        assert!(!report.success);
        assert_eq!(report.remaining_issues.len(), 1);
        assert_eq!(report.remaining_issues[0].position.id, rows[0].id);
    }

    #[tokio::test]
    async fn test_transient_read_failure_propagates() {
        let store = Arc::new(FlakyStore::new());
        let cap = capture("orca");
        seed(store.as_ref(), &cap, Vec::new()).await;
        store.fail_next_selects(2);
        let (qc, _) = sweep_over(store);

        let err = qc.run(cap.id).await.unwrap_err();
        assert!(err.is_transient());
    }

    #[tokio::test]
    async fn test_concurrent_sweeps_fix_once() {
        let store = Arc::new(MemoryStore::new());
        let cap = capture("orca");
        seed(
            store.as_ref(),
            &cap,
            vec![stored("orca", "SOL/USDC", obs("orca", "SOL/USDC0", ts(0)))],
        )
        .await;
        let (qc, _) = sweep_over(store);
        let qc = Arc::new(qc);

        let sweeps: Vec<_> = (0..4)
            .map(|_| {
                let qc = Arc::clone(&qc);
                tokio::spawn(async move { qc.run(cap.id).await })
            })
            .collect();

        let mut applied = 0;
        for sweep in sweeps {
            let report = sweep.await.unwrap().unwrap();
            assert!(report.success);
            applied += report.fixes_applied();
        }
        assert_eq!(applied, 1);
    }
}
