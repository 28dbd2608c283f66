use codegen::mpu6050::{self, GET_ACC, GET_ANGLE, GET_GYRO, SETUP, UPDATE};
use codegen::{
    BlockInstance, CodeFragment, CodegenError, Definitions, Extension, FieldValues,
    GenerationContext, Order, Pass, generate_program, template_fn,
};

use blockdef::{ArgSpec, BlockDescriptor, Manifest, ToolboxEntry};

fn ext() -> Extension {
    mpu6050::extension().expect("built-in extension must build")
}

fn generate_one(id: &str, fields: &[(&str, &str)]) -> Result<CodeFragment, CodegenError> {
    let values: FieldValues = fields.iter().copied().collect();
    let mut ctx = GenerationContext::new();
    ext().generate(id, &values, &mut ctx)
}

fn code(id: &str, fields: &[(&str, &str)]) -> String {
    generate_one(id, fields).expect("generation failed").code().to_string()
}

#[test]
fn schema_identity() {
    let ext = ext();
    for id in [SETUP, UPDATE, GET_ACC, GET_GYRO, GET_ANGLE] {
        assert_eq!(ext.lookup(id).unwrap().id, id);
    }
    assert_eq!(ext.schema().len(), 5);
}

#[test]
fn manifest_metadata() {
    let ext = ext();
    let manifest = ext.manifest();
    assert_eq!(manifest.name, "MPU6050");
    assert_eq!(manifest.category, "Sensors");
    assert_eq!(manifest.version, "1.1.0");
    assert_eq!(manifest.colour, "#E74C3C");
    assert_eq!(
        manifest.toolbox[0],
        ToolboxEntry::Label("For Setup MPU6050".into())
    );
    let ids: Vec<&str> = manifest.block_ids().collect();
    assert_eq!(ids, vec![SETUP, UPDATE, GET_ACC, GET_GYRO, GET_ANGLE]);
}

#[test]
fn generation_is_pure() {
    let first = generate_one(GET_GYRO, &[("axis", "z")]).unwrap();
    let second = generate_one(GET_GYRO, &[("axis", "z")]).unwrap();
    assert_eq!(first, second);
}

#[test]
fn setup_ignores_address() {
    let low = generate_one(SETUP, &[("addr", "0x68")]).unwrap();
    let high = generate_one(SETUP, &[("addr", "0x69")]).unwrap();
    assert_eq!(low, high);
    assert_eq!(low, CodeFragment::statement("mpu = MPU6050('X')\nmpu.setUp()"));
}

#[test]
fn setup_provides_import_once() {
    let ext = ext();
    let mut ctx = GenerationContext::new();
    for addr in ["0x68", "0x69", "0x68"] {
        let values = FieldValues::new().with("addr", addr);
        ext.generate(SETUP, &values, &mut ctx).unwrap();
    }
    assert_eq!(ctx.definitions.len(), 1);
    assert!(ctx.definitions.contains(mpu6050::IMPORT_KEY));
    assert_eq!(
        ctx.definitions.get(mpu6050::IMPORT_KEY),
        Some("from MPU6050 import MPU6050")
    );
}

#[test]
fn update_statement() {
    let update = generate_one(UPDATE, &[]).unwrap();
    assert!(update.is_statement());
    assert_eq!(update, CodeFragment::statement("mpu.update()"));
    assert!(!generate_one(GET_ACC, &[("axis", "x")]).unwrap().is_statement());
}

#[test]
fn accel_and_gyro_axes() {
    for axis in ["x", "y", "z"] {
        let acc = generate_one(GET_ACC, &[("axis", axis)]).unwrap();
        assert!(acc.code().ends_with(&format!(".{}()", axis)));
        assert_eq!(acc.code(), format!("mpu.accel.{}()", axis));
        assert_eq!(acc.order(), Some(Order::None));

        assert_eq!(code(GET_GYRO, &[("axis", axis)]), format!("mpu.gyro.{}()", axis));
    }
}

#[test]
fn angle_preserves_case() {
    let upper = code(GET_ANGLE, &[("angle", "X")]);
    assert_eq!(upper, "mpu.getAngleX()");
    assert!(upper.contains(&format!("{}X", mpu6050::ANGLE_METHOD_PREFIX)));

    let lower = code(GET_ANGLE, &[("angle", "x")]);
    assert_eq!(lower, "mpu.getAnglex()");
    assert_ne!(upper, lower);
}

#[test]
fn off_menu_value_warns() {
    let ext = ext();
    let mut ctx = GenerationContext::new();
    let values = FieldValues::new().with("angle", "x");
    ext.generate(GET_ANGLE, &values, &mut ctx).unwrap();
    assert_eq!(ctx.warnings.len(), 1);
    assert_eq!(ctx.warnings[0].block, GET_ANGLE);
    assert!(ctx.warnings[0].message.contains("\"x\""));

    let values = FieldValues::new().with("angle", "Y");
    ext.generate(GET_ANGLE, &values, &mut ctx).unwrap();
    assert_eq!(ctx.warnings.len(), 1);
}

#[test]
fn unknown_block() {
    assert_eq!(
        generate_one("mpu6050_Calibrate", &[]).unwrap_err(),
        CodegenError::UnknownBlock("mpu6050_Calibrate".into())
    );
}

#[test]
fn missing_and_unknown_fields() {
    assert_eq!(
        generate_one(GET_ACC, &[]).unwrap_err(),
        CodegenError::MissingField {
            block: GET_ACC.into(),
            field: "axis".into()
        }
    );
    assert_eq!(
        generate_one(UPDATE, &[("axis", "x")]).unwrap_err(),
        CodegenError::UnknownField {
            block: UPDATE.into(),
            field: "axis".into()
        }
    );
}

#[test]
fn failed_block_leaves_context_untouched() {
    let ext = ext();
    let mut ctx = GenerationContext::new();
    let err = ext.generate(SETUP, &FieldValues::new(), &mut ctx);
    assert!(err.is_err());
    assert!(ctx.definitions.is_empty());
    assert!(ctx.warnings.is_empty());
}

#[test]
fn end_to_end_program() {
    let program = generate_program(
        &ext(),
        &[
            BlockInstance::new(SETUP).field("addr", "0x68"),
            BlockInstance::new(UPDATE),
            BlockInstance::new(GET_ACC).field("axis", "y"),
        ],
    )
    .unwrap();
    assert_eq!(
        program.source,
        "from MPU6050 import MPU6050\n\
         mpu = MPU6050('X')\n\
         mpu.setUp()\n\
         mpu.update()\n\
         mpu.accel.y()\n"
    );
    assert!(program.warnings.is_empty());
}

#[test]
fn program_reports_failing_index() {
    let failure = generate_program(
        &ext(),
        &[
            BlockInstance::new(UPDATE),
            BlockInstance::new(GET_GYRO),
            BlockInstance::new(UPDATE),
        ],
    )
    .unwrap_err();
    assert_eq!(failure.index, 1);
    assert!(matches!(failure.error, CodegenError::MissingField { .. }));
}

#[test]
fn pass_keeps_earlier_output_after_failure() {
    let ext = ext();
    let mut pass = Pass::new(&ext);
    pass.emit(&BlockInstance::new(SETUP).field("addr", "0x69"))
        .unwrap();
    assert!(pass.emit(&BlockInstance::new("bogus")).is_err());
    pass.emit(&BlockInstance::new(UPDATE)).unwrap();

    let program = pass.finish();
    assert_eq!(
        program.source,
        "from MPU6050 import MPU6050\nmpu = MPU6050('X')\nmpu.setUp()\nmpu.update()\n"
    );
}

#[test]
fn passes_do_not_share_definitions() {
    let ext = ext();
    let with_setup = generate_program(&ext, &[BlockInstance::new(SETUP).field("addr", "0x68")]).unwrap();
    assert!(with_setup.source.starts_with("from MPU6050 import MPU6050\n"));

    let without = generate_program(&ext, &[BlockInstance::new(UPDATE)]).unwrap();
    assert_eq!(without.source, "mpu.update()\n");
}

#[test]
fn extension_shared_across_threads() {
    let ext = std::sync::Arc::new(ext());
    let handles: Vec<_> = ["x", "y", "z"]
        .into_iter()
        .map(|axis| {
            let ext = ext.clone();
            std::thread::spawn(move || {
                generate_program(
                    &ext,
                    &[
                        BlockInstance::new(SETUP).field("addr", "0x68"),
                        BlockInstance::new(GET_ACC).field("axis", axis),
                    ],
                )
                .map(|p| p.source)
            })
        })
        .collect();
    for (handle, axis) in handles.into_iter().zip(["x", "y", "z"]) {
        let source = handle.join().unwrap().unwrap();
        assert!(source.starts_with("from MPU6050 import MPU6050\n"));
        assert!(source.ends_with(&format!("mpu.accel.{}()\n", axis)));
        assert_eq!(source.matches("import").count(), 1);
    }
}

#[test]
fn definitions_last_write_wins_in_place() {
    let mut defs = Definitions::new();
    defs.provide("a", "import a");
    defs.provide("b", "import b");
    defs.provide("a", "import a as alpha");
    let lines: Vec<&str> = defs.lines().collect();
    assert_eq!(lines, vec!["import a as alpha", "import b"]);
}

#[test]
fn context_reset_starts_fresh_pass() {
    let ext = ext();
    let mut ctx = GenerationContext::new();
    ext.generate(SETUP, &FieldValues::new().with("addr", "0x68"), &mut ctx)
        .unwrap();
    assert!(!ctx.definitions.is_empty());
    ctx.reset();
    assert!(ctx.definitions.is_empty());
}

#[test]
fn expression_parenthesization() {
    let read = CodeFragment::expression("mpu.accel.x()", Order::None);
    assert_eq!(read.value_code(Order::None).unwrap(), "mpu.accel.x()");
    assert_eq!(read.value_code(Order::Additive).unwrap(), "(mpu.accel.x())");

    let call = CodeFragment::expression("mpu.getAngleX()", Order::FunctionCall);
    assert_eq!(call.value_code(Order::Additive).unwrap(), "mpu.getAngleX()");
    assert_eq!(call.value_code(Order::Member).unwrap(), "mpu.getAngleX()");

    let sum = CodeFragment::expression("a + b", Order::Additive);
    assert_eq!(sum.value_code(Order::Multiplicative).unwrap(), "(a + b)");
    assert_eq!(sum.value_code(Order::Relational).unwrap(), "a + b");

    let atom = CodeFragment::expression("42", Order::Atomic);
    assert_eq!(atom.value_code(Order::Atomic).unwrap(), "42");

    assert!(CodeFragment::statement("mpu.update()").value_code(Order::None).is_none());
}

#[test]
fn order_names_round_trip() {
    assert_eq!("none".parse::<Order>().unwrap(), Order::None);
    assert_eq!("function_call".parse::<Order>().unwrap(), Order::FunctionCall);
    assert!("tightest".parse::<Order>().is_err());
}

#[test]
fn registry_rejects_duplicate_template() {
    let result = Extension::builder(Manifest::new("Dup"))
        .block(BlockDescriptor::statement("beep", "beep"), |_, _| {
            Ok(CodeFragment::statement("beep()"))
        })
        .and_then(|b| {
            b.template(
                "beep",
                template_fn(|_, _| Ok(CodeFragment::statement("boop()"))),
            )
        });
    assert_eq!(result.err(), Some(CodegenError::DuplicateId("beep".into())));
}

#[test]
fn builder_requires_template_per_block() {
    let result = Extension::builder(Manifest::new("Half"))
        .descriptor(
            BlockDescriptor::expression("level", "level of %1")
                .with_arg(ArgSpec::dropdown("pin", ["A0", "A1"])),
        )
        .and_then(|b| b.build());
    assert_eq!(result.err(), Some(CodegenError::MissingTemplate("level".into())));
}

#[test]
fn builder_checks_toolbox_ids() {
    let result = Extension::builder(Manifest::new("Toolbox").block("ghost")).build();
    assert_eq!(result.err(), Some(CodegenError::UnknownBlock("ghost".into())));
}
