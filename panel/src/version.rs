use common::version::Version;

pub const VERSION: Version = Version {
    major: 0,
    minor: 1,
    patch: 0,
};

pub const AUTHORS: [&str; 1] = ["Hatchery"];
