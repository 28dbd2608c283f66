//! Built-in blocks for the MPU6050 six-axis accelerometer/gyroscope.
//!
//! The generated MicroPython talks to the `MPU6050` driver module through a
//! single handle named `mpu`.

use blockdef::{ArgSpec, BlockDescriptor, Manifest};

use crate::context::Definitions;
use crate::error::CodegenError;
use crate::extension::Extension;
use crate::fields::Fields;
use crate::fragment::{CodeFragment, Order};

pub const SETUP: &str = "mpu6050_Setup";
pub const UPDATE: &str = "mpu6050_Update";
pub const GET_ACC: &str = "mpu6050_get_Acc";
pub const GET_GYRO: &str = "mpu6050_get_Gyro";
pub const GET_ANGLE: &str = "mpu6050_get_Angle";

pub const COLOUR: &str = "#E74C3C";

pub const IMPORT_KEY: &str = "from_mpu6050_import_mpu6050";
pub const IMPORT_LINE: &str = "from MPU6050 import MPU6050";

/// Prefix of the tilt-angle getters: `getAngleX`, `getAngleY`, `getAngleZ`.
pub const ANGLE_METHOD_PREFIX: &str = "getAngle";

pub fn manifest() -> Manifest {
    Manifest {
        name: "MPU6050".into(),
        description: "Read gyro data from mpu6050".into(),
        author: "Nawa Phansaen".into(),
        category: "Sensors".into(),
        version: "1.1.0".into(),
        icon: "/static/icon.png".into(),
        colour: COLOUR.into(),
        toolbox: Vec::new(),
    }
    .label("For Setup MPU6050")
    .block(SETUP)
    .label("For read data from mpu6050")
    .block(UPDATE)
    .block(GET_ACC)
    .block(GET_GYRO)
    .block(GET_ANGLE)
}

pub fn extension() -> Result<Extension, CodegenError> {
    Extension::builder(manifest())
        .block(
            BlockDescriptor::statement(SETUP, "MPU6050 setup with address %1")
                .with_arg(ArgSpec::dropdown("addr", ["0x68", "0x69"]))
                .with_colour(COLOUR),
            setup,
        )?
        .block(
            BlockDescriptor::statement(UPDATE, "MPU6050 update data").with_colour(COLOUR),
            update,
        )?
        .block(
            BlockDescriptor::expression(GET_ACC, "MPU6050 get acceleration %1")
                .with_arg(ArgSpec::dropdown("axis", ["x", "y", "z"]))
                .with_colour(COLOUR),
            get_acc,
        )?
        .block(
            BlockDescriptor::expression(GET_GYRO, "MPU6050 get gyro %1")
                .with_arg(ArgSpec::dropdown("axis", ["x", "y", "z"]))
                .with_colour(COLOUR),
            get_gyro,
        )?
        .block(
            BlockDescriptor::expression(GET_ANGLE, "MPU6050 get Angle %1")
                .with_arg(ArgSpec::dropdown("angle", ["X", "Y", "Z"]))
                .with_colour(COLOUR),
            get_angle,
        )?
        .build()
}

// The driver is always constructed with the 'X' side string; the address
// field does not reach the generated code.
fn setup(fields: &Fields<'_>, defs: &mut Definitions) -> Result<CodeFragment, CodegenError> {
    fields.value("addr")?;
    defs.provide(IMPORT_KEY, IMPORT_LINE);
    Ok(CodeFragment::statement("mpu = MPU6050('X')\nmpu.setUp()"))
}

fn update(_fields: &Fields<'_>, _defs: &mut Definitions) -> Result<CodeFragment, CodegenError> {
    Ok(CodeFragment::statement("mpu.update()"))
}

fn get_acc(fields: &Fields<'_>, _defs: &mut Definitions) -> Result<CodeFragment, CodegenError> {
    let axis = fields.value("axis")?;
    Ok(CodeFragment::expression(
        format!("mpu.accel.{}()", axis),
        Order::None,
    ))
}

fn get_gyro(fields: &Fields<'_>, _defs: &mut Definitions) -> Result<CodeFragment, CodegenError> {
    let axis = fields.value("axis")?;
    Ok(CodeFragment::expression(
        format!("mpu.gyro.{}()", axis),
        Order::None,
    ))
}

fn get_angle(fields: &Fields<'_>, _defs: &mut Definitions) -> Result<CodeFragment, CodegenError> {
    let axis = fields.value("angle")?;
    Ok(CodeFragment::expression(
        format!("mpu.{}{}()", ANGLE_METHOD_PREFIX, axis),
        Order::None,
    ))
}
