use cartage_engine::orchestrator::TripOrchestrator;

pub struct AppState {
    pub orchestrator: TripOrchestrator,
}
