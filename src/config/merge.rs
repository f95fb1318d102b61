use std::path::PathBuf;

use super::{Config, ConfigLayer};

pub fn merge_layers(user: Option<ConfigLayer>, explicit: Option<ConfigLayer>) -> Config {
    let mut config = Config::default();
    if let Some(layer) = user {
        layer.apply_to(&mut config);
    }
    if let Some(layer) = explicit {
        layer.apply_to(&mut config);
    }
    config
}

pub fn apply_env_overrides(config: &mut Config) {
    apply_overrides_from(config, |key| std::env::var(key).ok());
}

/// Applies `ELOBOT_*` overrides read through `lookup`. Blank values are
/// treated as unset; unparsable ones are logged and skipped.
pub fn apply_overrides_from<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let value = |key: &str| {
        lookup(key)
            .map(|raw| raw.trim().to_string())
            .filter(|raw| !raw.is_empty())
    };

    if let Some(server) = value("ELOBOT_IRC_SERVER") {
        config.irc.server = server;
    }

    if let Some(raw) = value("ELOBOT_IRC_PORT") {
        match raw.parse::<u16>() {
            Ok(port) => config.irc.port = port,
            Err(err) => tracing::warn!("invalid ELOBOT_IRC_PORT, ignoring: {err}"),
        }
    }

    if let Some(nickname) = value("ELOBOT_NICKNAME") {
        if nickname.chars().any(char::is_whitespace) {
            tracing::warn!("invalid ELOBOT_NICKNAME, ignoring: contains whitespace");
        } else {
            config.irc.nickname = nickname;
        }
    }

    if let Some(channel) = value("ELOBOT_CHANNEL") {
        config.irc.channel = channel;
    }

    if let Some(path) = value("ELOBOT_STATE_FILE") {
        config.storage.state_file = Some(PathBuf::from(path));
    }

    if let Some(prefix) = value("ELOBOT_COMMAND_PREFIX") {
        config.ladder.command_prefix = prefix;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::collections::HashMap;

    use crate::config::LadderConfigOverride;

    fn env(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn merge_layers_respects_precedence() {
        let mut user = ConfigLayer::default();
        user.ladder = LadderConfigOverride {
            k_factor: Some(16),
            top_count: Some(5),
            ..LadderConfigOverride::default()
        };
        user.irc.channel = Some("#user".into());

        let mut explicit = ConfigLayer::default();
        explicit.ladder.k_factor = Some(40);

        let config = merge_layers(Some(user), Some(explicit));
        assert_eq!(config.ladder.k_factor, 40);
        assert_eq!(config.ladder.top_count, 5);
        assert_eq!(config.irc.channel, "#user");
        assert_eq!(config.ladder.initial_rating, 1200);
    }

    #[test]
    fn env_overrides_apply() {
        let mut config = Config::default();
        apply_overrides_from(
            &mut config,
            env(&[
                ("ELOBOT_IRC_SERVER", "irc.example.net"),
                ("ELOBOT_IRC_PORT", "7000"),
                ("ELOBOT_NICKNAME", "ladder"),
                ("ELOBOT_CHANNEL", "#games"),
                ("ELOBOT_STATE_FILE", "/var/lib/elobot/ladder.json"),
                ("ELOBOT_COMMAND_PREFIX", "!"),
            ]),
        );

        assert_eq!(config.irc.server, "irc.example.net");
        assert_eq!(config.irc.port, 7000);
        assert_eq!(config.irc.nickname, "ladder");
        assert_eq!(config.irc.channel, "#games");
        assert_eq!(
            config.state_file(),
            PathBuf::from("/var/lib/elobot/ladder.json")
        );
        assert_eq!(config.ladder.command_prefix, "!");
    }

    #[test]
    fn invalid_and_blank_env_values_are_ignored() {
        let mut config = Config::default();
        apply_overrides_from(
            &mut config,
            env(&[
                ("ELOBOT_IRC_PORT", "seventy"),
                ("ELOBOT_NICKNAME", "a b"),
                ("ELOBOT_CHANNEL", "   "),
            ]),
        );

        assert_eq!(config.irc.port, 6667);
        assert_eq!(config.irc.nickname, "elobot");
        assert_eq!(config.irc.channel, "#openra");
    }
}
