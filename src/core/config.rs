use serde::Deserialize;

// Gate runtime configuration.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    // Capacity of the gate event queue.
    event_channel_buffer: Option<usize>,
    // Capacity of the command channel shared by gate handles.
    command_channel_buffer: Option<usize>,
}

impl Config {
    const DEFAULT_EVENT_CHANNEL_BUFFER: usize = 64;
    const DEFAULT_COMMAND_CHANNEL_BUFFER: usize = 16;

    // Bounded channels require at least one slot.
    pub(crate) fn event_channel_buffer(&self) -> usize {
        self.event_channel_buffer
            .map_or(Config::DEFAULT_EVENT_CHANNEL_BUFFER, |val| val.max(1))
    }

    pub(crate) fn command_channel_buffer(&self) -> usize {
        self.command_channel_buffer
            .map_or(Config::DEFAULT_COMMAND_CHANNEL_BUFFER, |val| val.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_buffers_are_raised_to_one() {
        let config: Config =
            serde_yaml::from_str("event_channel_buffer: 0\ncommand_channel_buffer: 0").unwrap();
        assert_eq!(config.event_channel_buffer(), 1);
        assert_eq!(config.command_channel_buffer(), 1);

        let config = Config::default();
        assert_eq!(config.event_channel_buffer(), 64);
        assert_eq!(config.command_channel_buffer(), 16);
    }
}
