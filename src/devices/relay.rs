use super::SettingSpec;

/// Relay settings attached to the shared settings service.
pub static SETTINGS: [SettingSpec; 3] = [
    SettingSpec { path: "/Settings/Relay/2/InitialState", default: 0, min: 0, max: 1 },
    SettingSpec { path: "/Settings/Relay/2/Function", default: 0, min: 0, max: 3 },
    SettingSpec { path: "/Settings/Relay/2/Polarity", default: 0, min: 0, max: 1 },
];
