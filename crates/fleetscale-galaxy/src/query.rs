//! GraphQL documents sent to the Galaxy API.

/// Application snapshot with app-level and per-container metric series.
pub const GET_APP: &str = r#"
query getApp($hostname: String!, $seriesName: String!, $limit: Int!) {
  app(hostname: $hostname) {
    _id
    hostname
    status
    containerCount
    metrics(seriesName: $seriesName, limit: $limit) {
      _id
      memory
      memoryCap
      cpu
      cpuCap
      connections
      timestamp
    }
    containers {
      _id
      status
      up
      metrics(seriesName: $seriesName, limit: $limit) {
        _id
        memory
        memoryCap
        cpu
        cpuCap
        connections
        timestamp
      }
    }
  }
}
"#;

pub const SET_CONTAINER_COUNT: &str = r#"
mutation SetContainerCountForApp($appId: String!, $containerCount: Int!) {
  setContainerCountForApp(appId: $appId, containerCount: $containerCount) {
    status
  }
}
"#;

pub const KILL_CONTAINER: &str = r#"
mutation KillContainer($appId: String!, $containerId: String!) {
  killContainer(appId: $appId, containerId: $containerId)
}
"#;
