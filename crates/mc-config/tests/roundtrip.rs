use mc_config::*;
use mc_controls::OperatingMode;

#[test]
fn roundtrip_yaml_default_config() {
    let config = ControllerConfig::default();
    validate_config(&config).unwrap();

    let path = std::env::temp_dir().join("mc_config_roundtrip_default.yaml");
    save_yaml(&path, &config).unwrap();
    let loaded = load_yaml(&path).unwrap();

    assert_eq!(config, loaded);
}

#[test]
fn roundtrip_yaml_with_schedule_and_plant() {
    let config = ControllerConfig {
        name: "bench rig".to_string(),
        feedback: FeedbackDef::Plant {
            tau_s: 0.15,
            max_speed_hz: 2000.0,
            max_accel_hz_per_s: 4000.0,
        },
        schedule: vec![
            ScheduledCommandDef {
                at_tick: 200,
                command: CommandDef::Setpoint { hz: 1200.0 },
            },
            ScheduledCommandDef {
                at_tick: 400,
                command: CommandDef::Request {
                    mode: OperatingMode::Stopped,
                },
            },
        ],
        ..ControllerConfig::default()
    };

    let text = to_yaml_string(&config).unwrap();
    let loaded = parse_yaml(&text).unwrap();
    assert_eq!(config, loaded);
}

#[test]
fn sparse_file_takes_defaults() {
    let text = r#"
version: 1
control:
  setpoint_hz: 650.0
feedback:
  type: encoder
  pulses_per_revolution: 1024
schedule:
  - at_tick: 50
    command:
      type: request
      mode: stopped
"#;
    let config = parse_yaml(text).unwrap();

    assert_eq!(config.control.setpoint_hz, 650.0);
    assert_eq!(config.control.period_s, 0.01);
    assert_eq!(config.pid, PidDef::default());
    assert_eq!(config.actuator.resolution_ticks, 8000);
    assert_eq!(
        config.feedback,
        FeedbackDef::Encoder {
            pulses_per_revolution: 1024.0
        }
    );
    assert_eq!(
        config.schedule[0].command,
        CommandDef::Request {
            mode: OperatingMode::Stopped
        }
    );
}

#[test]
fn invalid_file_is_rejected_on_load() {
    let text = r#"
version: 1
pid:
  out_min: 10.0
  out_max: 0.0
"#;
    let err = parse_yaml(text).unwrap_err();
    assert!(matches!(err, ConfigError::Validation(_)));
}

#[test]
fn save_refuses_invalid_config() {
    let mut config = ControllerConfig::default();
    config.control.period_s = -1.0;

    let path = std::env::temp_dir().join("mc_config_roundtrip_invalid.yaml");
    assert!(save_yaml(&path, &config).is_err());
}

#[test]
fn missing_file_is_io_error() {
    let path = std::env::temp_dir().join("mc_config_does_not_exist.yaml");
    assert!(matches!(load_yaml(&path), Err(ConfigError::Io(_))));
}
