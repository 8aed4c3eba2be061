//! Session count sensor

use crate::snapshot::SnapshotReader;
use plex_client::ServerInfo;
use serde::Serialize;

const UNKNOWN_USER: &str = "Unknown";

/// One active session as shown in the sensor attributes
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionDetail {
    pub user: String,
    pub title: String,
    pub player: String,
    pub state: String,
}

/// State attributes of the sessions sensor
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SensorAttributes {
    /// Distinct users in first-seen order
    pub active_users: Vec<String>,
    /// Number of sessions per user, in the same order as `active_users`
    pub user_session_counts: Vec<(String, usize)>,
    pub session_details: Vec<SessionDetail>,
}

/// Reports the number of active sessions on one server
pub struct SessionsSensor {
    server_info: ServerInfo,
    snapshot: SnapshotReader,
}

impl SessionsSensor {
    pub fn new(server_info: ServerInfo, snapshot: SnapshotReader) -> Self {
        Self {
            server_info,
            snapshot,
        }
    }

    pub fn name(&self) -> String {
        format!("Plex Sessions ({})", self.server_info.friendly_name)
    }

    pub fn unique_id(&self) -> String {
        format!("{}_sessions", self.server_info.machine_identifier)
    }

    pub fn icon(&self) -> &'static str {
        "mdi:plex"
    }

    pub fn available(&self) -> bool {
        self.snapshot.is_available()
    }

    pub fn native_value(&self) -> usize {
        self.snapshot.current().sessions.len()
    }

    pub fn attributes(&self) -> SensorAttributes {
        let snapshot = self.snapshot.current();
        let mut attributes = SensorAttributes::default();

        for session in &snapshot.sessions {
            let user = session
                .usernames()
                .first()
                .map(|u| u.to_string())
                .unwrap_or_else(|| UNKNOWN_USER.to_string());

            match attributes
                .user_session_counts
                .iter_mut()
                .find(|(name, _)| *name == user)
            {
                Some((_, count)) => *count += 1,
                None => {
                    attributes.active_users.push(user.clone());
                    attributes.user_session_counts.push((user.clone(), 1));
                }
            }

            attributes.session_details.push(SessionDetail {
                user,
                title: session.title.clone(),
                player: session.player.title.clone(),
                state: session.player.state.clone(),
            });
        }

        attributes
    }
}

impl std::fmt::Debug for SessionsSensor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionsSensor")
            .field("server", &self.server_info.machine_identifier)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshot::Snapshot;
    use plex_client::{Session, SessionPlayer, SessionUser};

    fn session(user: Option<&str>, title: &str) -> Session {
        Session {
            title: title.to_string(),
            user: user.map(|u| SessionUser {
                id: "1".to_string(),
                title: u.to_string(),
            }),
            player: SessionPlayer {
                machine_identifier: format!("{}-player", title),
                title: "Living Room".to_string(),
                state: "playing".to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn sensor(sessions: Vec<Session>) -> SessionsSensor {
        let info = ServerInfo {
            friendly_name: "Basement".to_string(),
            machine_identifier: "srv-1".to_string(),
            version: "1.40.0".to_string(),
        };
        SessionsSensor::new(info, SnapshotReader::fixed(Snapshot::new(sessions, vec![], vec![])))
    }

    #[test]
    fn test_identity() {
        let sensor = sensor(vec![]);
        assert_eq!(sensor.name(), "Plex Sessions (Basement)");
        assert_eq!(sensor.unique_id(), "srv-1_sessions");
        assert_eq!(sensor.icon(), "mdi:plex");
        assert_eq!(sensor.native_value(), 0);
        assert_eq!(sensor.attributes(), SensorAttributes::default());
    }

    #[test]
    fn test_attributes_group_by_user() {
        let sensor = sensor(vec![
            session(Some("alice"), "A"),
            session(None, "B"),
            session(Some("alice"), "C"),
        ]);
        let attributes = sensor.attributes();

        assert_eq!(sensor.native_value(), 3);
        assert_eq!(attributes.active_users, vec!["alice", "Unknown"]);
        assert_eq!(
            attributes.user_session_counts,
            vec![("alice".to_string(), 2), ("Unknown".to_string(), 1)]
        );
        assert_eq!(attributes.session_details.len(), 3);
        assert_eq!(attributes.session_details[1].user, "Unknown");
        assert_eq!(attributes.session_details[2].title, "C");
        assert_eq!(attributes.session_details[0].player, "Living Room");
        assert_eq!(attributes.session_details[0].state, "playing");
    }
}
