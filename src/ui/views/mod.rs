mod leagues;
mod matches;
mod standings;
mod teams;

pub use leagues::LeaguesView;
pub use matches::MatchesView;
pub use standings::StandingsView;
pub use teams::TeamsView;
