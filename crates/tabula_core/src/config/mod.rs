use std::collections::HashMap;
use std::sync::LazyLock;

use tabula_error::{DbError, Result};

use crate::arrays::scalar::ScalarValue;

pub const DEFAULT_MAX_GROUP_COUNT: usize = 1 << 32;

/// Configuration for executing lazy frames.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Evaluate independent expressions on the rayon pool.
    pub parallel_expressions: bool,
    /// Rechunk every column of a collected frame into a single chunk.
    pub rechunk_output: bool,
    /// Maximum number of distinct groups a group by may produce.
    pub max_group_count: usize,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        ExecutionConfig {
            parallel_expressions: true,
            rechunk_output: false,
            max_group_count: DEFAULT_MAX_GROUP_COUNT,
        }
    }
}

impl ExecutionConfig {
    pub fn set_from_scalar(&mut self, name: &str, value: ScalarValue) -> Result<()> {
        let func = GET_SET_FUNCTIONS.get(name).ok_or_else(|| missing_setting(name))?;
        (func.set)(value, self)
    }

    pub fn get_as_scalar(&self, name: &str) -> Result<ScalarValue> {
        let func = GET_SET_FUNCTIONS.get(name).ok_or_else(|| missing_setting(name))?;
        Ok((func.get)(self))
    }

    pub fn reset(&mut self, name: &str) -> Result<()> {
        let func = GET_SET_FUNCTIONS.get(name).ok_or_else(|| missing_setting(name))?;
        let scalar = (func.get)(&Self::default());
        (func.set)(scalar, self)
    }

    /// Names and descriptions of all settings, sorted by name.
    pub fn settings() -> Vec<(&'static str, &'static str)> {
        let mut settings: Vec<_> = GET_SET_FUNCTIONS
            .iter()
            .map(|(name, func)| (*name, func.description))
            .collect();
        settings.sort_unstable();
        settings
    }
}

fn missing_setting(name: &str) -> DbError {
    DbError::invalid_input(format!("Missing setting for '{name}'"))
}

fn invalid_value(name: &str, value: &ScalarValue) -> DbError {
    DbError::invalid_input(format!("Invalid value for setting '{name}'"))
        .with_field("value", value)
}

struct SettingFunctions {
    set: fn(scalar: ScalarValue, conf: &mut ExecutionConfig) -> Result<()>,
    get: fn(conf: &ExecutionConfig) -> ScalarValue,
    description: &'static str,
}

impl SettingFunctions {
    const fn new<S: ExecutionSetting>() -> Self {
        SettingFunctions {
            set: S::set_from_scalar as _,
            get: S::get_as_scalar as _,
            description: S::DESCRIPTION,
        }
    }
}

fn insert_setting<S: ExecutionSetting>(map: &mut HashMap<&'static str, SettingFunctions>) {
    if map.insert(S::NAME, SettingFunctions::new::<S>()).is_some() {
        panic!("Duplicate settings names: {}", S::NAME);
    }
}

static GET_SET_FUNCTIONS: LazyLock<HashMap<&'static str, SettingFunctions>> = LazyLock::new(|| {
    let mut map = HashMap::new();

    insert_setting::<ParallelExpressions>(&mut map);
    insert_setting::<RechunkOutput>(&mut map);
    insert_setting::<MaxGroupCount>(&mut map);

    map
});

pub trait ExecutionSetting: Sync + Send + 'static {
    const NAME: &'static str;
    const DESCRIPTION: &'static str;

    fn set_from_scalar(scalar: ScalarValue, conf: &mut ExecutionConfig) -> Result<()>;
    fn get_as_scalar(conf: &ExecutionConfig) -> ScalarValue;
}

pub struct ParallelExpressions;

impl ExecutionSetting for ParallelExpressions {
    const NAME: &'static str = "parallel_expressions";
    const DESCRIPTION: &'static str = "Evaluate independent expressions in parallel";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut ExecutionConfig) -> Result<()> {
        let val = scalar
            .try_as_bool()
            .map_err(|_| invalid_value(Self::NAME, &scalar))?;
        conf.parallel_expressions = val;
        Ok(())
    }

    fn get_as_scalar(conf: &ExecutionConfig) -> ScalarValue {
        conf.parallel_expressions.into()
    }
}

pub struct RechunkOutput;

impl ExecutionSetting for RechunkOutput {
    const NAME: &'static str = "rechunk_output";
    const DESCRIPTION: &'static str = "Rechunk the columns of collected frames";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut ExecutionConfig) -> Result<()> {
        let val = scalar
            .try_as_bool()
            .map_err(|_| invalid_value(Self::NAME, &scalar))?;
        conf.rechunk_output = val;
        Ok(())
    }

    fn get_as_scalar(conf: &ExecutionConfig) -> ScalarValue {
        conf.rechunk_output.into()
    }
}

pub struct MaxGroupCount;

impl ExecutionSetting for MaxGroupCount {
    const NAME: &'static str = "max_group_count";
    const DESCRIPTION: &'static str = "Maximum number of groups produced by a group by";

    fn set_from_scalar(scalar: ScalarValue, conf: &mut ExecutionConfig) -> Result<()> {
        let val = scalar
            .try_as_usize()
            .map_err(|_| invalid_value(Self::NAME, &scalar))?;
        if val == 0 {
            return Err(DbError::invalid_input("Max group count cannot be zero"));
        }
        conf.max_group_count = val;
        Ok(())
    }

    fn get_as_scalar(conf: &ExecutionConfig) -> ScalarValue {
        (conf.max_group_count as u64).into()
    }
}

#[cfg(test)]
mod tests {
    use tabula_error::ErrorKind;

    use super::*;

    #[test]
    fn set_setting_exists() {
        let mut conf = ExecutionConfig::default();
        conf.set_from_scalar("rechunk_output", true.into()).unwrap();

        let val = conf.get_as_scalar("rechunk_output").unwrap();
        assert!(val.try_as_bool().unwrap());
        assert!(conf.rechunk_output);
    }

    #[test]
    fn set_setting_not_exists() {
        let mut conf = ExecutionConfig::default();
        let err = conf.set_from_scalar("hello_world", 58.into()).unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
    }

    #[test]
    fn set_casts_value() {
        let mut conf = ExecutionConfig::default();
        conf.set_from_scalar("max_group_count", ScalarValue::Int8(13))
            .unwrap();

        let val = conf.get_as_scalar("max_group_count").unwrap();
        assert_eq!(ScalarValue::UInt64(13), val);
    }

    #[test]
    fn bad_values() {
        let mut conf = ExecutionConfig::default();
        let err = conf
            .set_from_scalar("parallel_expressions", "yes".into())
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());

        let err = conf
            .set_from_scalar("max_group_count", ScalarValue::Int32(-1))
            .unwrap_err();
        assert_eq!(ErrorKind::InvalidInput, err.kind());
        assert_eq!(ExecutionConfig::default(), conf);
    }

    #[test]
    fn reset_to_default() {
        let mut conf = ExecutionConfig {
            parallel_expressions: false,
            ..Default::default()
        };
        conf.reset("parallel_expressions").unwrap();
        assert!(conf.parallel_expressions);
        assert_eq!(3, ExecutionConfig::settings().len());
    }
}
