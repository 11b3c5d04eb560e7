//! Persistence across process restarts: everything the scheduler and the
//! saved-search list write must come back from a reopened database file.

use nexus_core::persist::{add_saved_search, load_saved_searches};
use nexus_core::{
    AgentDraft, Cadence, CollectingSink, DAY_MS, ExecutionError, ManualClock, QueryExecutor,
    QueryModel, QueryRequest, ResultRecord, SchedulerService,
};
use nexus_store::open_data_dir;

const NOW: i64 = 1_771_632_000_000;

struct Failing;

impl QueryExecutor for Failing {
    async fn execute(&self, _request: &QueryRequest) -> Result<Vec<ResultRecord>, ExecutionError> {
        Err(ExecutionError::Unavailable("offline".into()))
    }
}

#[tokio::test]
async fn agents_and_failures_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let clock = ManualClock::new(NOW);

    let id = {
        let store = open_data_dir(tmp.path()).unwrap();
        let mut service = SchedulerService::new(clock.clone(), store).unwrap();
        let agent = service
            .create_agent(AgentDraft::new("Weekly", "moon").with_schedule(Cadence::Weekly))
            .unwrap();
        clock.advance(7 * DAY_MS);
        let sink = CollectingSink::new();
        service.run_tick(&Failing, &sink).await.unwrap();
        assert_eq!(sink.take().len(), 1);
        agent.id
    };

    let store = open_data_dir(tmp.path()).unwrap();
    let service = SchedulerService::new(clock, store).unwrap();
    let agent = &service.agents()[0];
    assert_eq!(agent.id, id);
    assert!(agent.active, "failures never deactivate an agent");
    assert_eq!(agent.last_run, None, "failed runs leave last_run untouched");
}

#[test]
fn saved_searches_survive_reopen() {
    let tmp = tempfile::tempdir().unwrap();
    let mut model = QueryModel::new();
    model.add_filter("moon");
    model.add_filter("mood:positive");
    let saved = model.save_search("moods", NOW);

    {
        let store = open_data_dir(tmp.path()).unwrap();
        add_saved_search(&store, &saved).unwrap();
    }

    let store = open_data_dir(tmp.path()).unwrap();
    let loaded = load_saved_searches(&store).unwrap();
    assert_eq!(loaded.items, vec![saved]);
}
