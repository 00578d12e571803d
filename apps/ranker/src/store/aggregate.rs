//! Aggregator: rebuilds the ranked summary from whatever the store holds.

use tracing::info;

use crate::errors::AppError;
use crate::models::score::{AggregateResult, ScoreRecord};
use crate::store::{write_atomically, ResultStore};

/// Reserved-prefix name, so `load_all` never reads the aggregate back in.
pub const AGGREGATE_FILENAME: &str = "_final_results.json";

/// Loads all records, drops any without a usable score, sorts by score descending
/// (stable, so ties keep load order) and replaces the aggregate artifact.
pub async fn aggregate(store: &ResultStore) -> Result<AggregateResult, AppError> {
    let records = store.load_all().await?;
    let records = rank(records);
    info!("Aggregated {} scored resumes in total", records.len());

    let location = store.root().join(AGGREGATE_FILENAME);
    let json = serde_json::to_vec_pretty(&records)?;
    write_atomically(&location, &json).await?;
    info!("Saved final sorted results to {}", location.display());

    Ok(AggregateResult { records, location })
}

fn rank(records: Vec<ScoreRecord>) -> Vec<ScoreRecord> {
    let mut records: Vec<ScoreRecord> = records
        .into_iter()
        .filter(|r| r.score.is_finite())
        .collect();
    records.sort_by(|a, b| b.score.total_cmp(&a.score));
    records
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, score: f64, filename: &str) -> ScoreRecord {
        ScoreRecord::new(name.to_string(), score, "r".to_string(), filename.to_string())
    }

    #[test]
    fn test_rank_descending_with_stable_ties() {
        let ranked = rank(vec![
            record("first-tie", 80.0, "a.pdf"),
            record("low", 10.0, "b.pdf"),
            record("top", 95.5, "c.pdf"),
            record("second-tie", 80.0, "d.pdf"),
        ]);
        let names: Vec<_> = ranked.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["top", "first-tie", "second-tie", "low"]);
    }

    #[tokio::test]
    async fn test_aggregate_writes_sorted_artifact() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();
        store.save(&record("A", 87.0, "a.pdf")).await.unwrap();
        store.save(&record("B", 91.2, "b.pdf")).await.unwrap();

        let result = aggregate(&store).await.unwrap();
        assert_eq!(result.location, dir.path().join(AGGREGATE_FILENAME));
        assert_eq!(result.records[0].name, "B");

        let on_disk: Vec<ScoreRecord> =
            serde_json::from_slice(&std::fs::read(&result.location).unwrap()).unwrap();
        assert_eq!(on_disk, result.records);
    }

    #[tokio::test]
    async fn test_aggregate_does_not_include_itself() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();
        store.save(&record("A", 50.0, "a.pdf")).await.unwrap();

        aggregate(&store).await.unwrap();
        let second = aggregate(&store).await.unwrap();
        assert_eq!(second.records.len(), 1);
    }

    #[tokio::test]
    async fn test_aggregate_is_repeatable() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();
        for (name, score) in [("A", 70.0), ("B", 70.0), ("C", 99.0), ("D", 12.5)] {
            store
                .save(&record(name, score, &format!("{}.pdf", name.to_lowercase())))
                .await
                .unwrap();
        }

        let first = aggregate(&store).await.unwrap();
        let second = aggregate(&store).await.unwrap();
        assert_eq!(first.records, second.records);
    }

    #[tokio::test]
    async fn test_aggregate_of_empty_store_writes_empty_array() {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path()).await.unwrap();
        let result = aggregate(&store).await.unwrap();
        assert!(result.records.is_empty());
        assert_eq!(std::fs::read_to_string(&result.location).unwrap(), "[]");
    }
}
