use codegen::loader::{LoadError, Loader, load_str};
use codegen::mpu6050;
use codegen::{BlockInstance, CodeFragment, FieldValues, GenerationContext, Order, generate_program};

use blockdef::{ArgKind, ConnectionShape, ToolboxEntry};

const MPU6050_TOML: &str = include_str!("../../extensions/mpu6050.toml");

fn load_errors(source: &str) -> Vec<LoadError> {
    match load_str(source) {
        Ok(_) => panic!("expected load errors"),
        Err(errors) => errors,
    }
}

fn messages(errors: &[LoadError]) -> Vec<String> {
    errors.iter().map(|e| e.message.clone()).collect()
}

const BUZZER: &str = r##"
[extension]
name = "Buzzer"
colour = "#27AE60"
toolbox = [{ label = "Sound" }, "buzzer_beep", "buzzer_playing"]

[[block]]
id = "buzzer_beep"
message = "beep %1 for %2 ms"
shape = "statement"

[[block.arg]]
name = "pin"
kind = "dropdown"
options = [["Pin 12", "12"], ["Pin 13", "13"]]

[[block.arg]]
name = "ms"
kind = "number"
default = 100

[block.template]
statement = "buzzer.beep({pin}, {ms})"
definitions = [
    { key = "import_buzzer", line = "import buzzer" },
    { key = "buzzer_pin_{pin}", line = "buzzer.attach({pin})" },
]

[[block]]
id = "buzzer_playing"
message = "buzzer is playing"
shape = "expression"
colour = "#000000"

[block.template]
expression = "buzzer.playing() or {{}}"
order = "logical_or"
"##;

#[test]
fn declarative_twin_matches_builtin() {
    let loaded = load_str(MPU6050_TOML).expect("twin must load");
    let builtin = mpu6050::extension().unwrap();

    assert_eq!(loaded.manifest(), builtin.manifest());
    let loaded_blocks: Vec<_> = loaded.schema().iter().cloned().collect();
    let builtin_blocks: Vec<_> = builtin.schema().iter().cloned().collect();
    assert_eq!(loaded_blocks, builtin_blocks);

    let cases: &[(&str, &[(&str, &str)])] = &[
        (mpu6050::SETUP, &[("addr", "0x69")]),
        (mpu6050::UPDATE, &[]),
        (mpu6050::GET_ACC, &[("axis", "z")]),
        (mpu6050::GET_GYRO, &[("axis", "x")]),
        (mpu6050::GET_ANGLE, &[("angle", "Y")]),
    ];
    for (id, fields) in cases {
        let values: FieldValues = fields.iter().copied().collect();
        let mut a = GenerationContext::new();
        let mut b = GenerationContext::new();
        assert_eq!(
            loaded.generate(id, &values, &mut a).unwrap(),
            builtin.generate(id, &values, &mut b).unwrap(),
            "block {}",
            id
        );
        assert_eq!(a.definitions, b.definitions);
    }
}

#[test]
fn buzzer_extension_loads() {
    let ext = load_str(BUZZER).unwrap();
    assert_eq!(ext.manifest().name, "Buzzer");
    assert_eq!(ext.manifest().toolbox[0], ToolboxEntry::Label("Sound".into()));

    let beep = ext.lookup("buzzer_beep").unwrap();
    assert_eq!(beep.shape, ConnectionShape::Statement);
    assert_eq!(beep.style.colour, "#27AE60");
    assert_eq!(beep.args[1].kind, ArgKind::Number { default: 100.0 });
    assert_eq!(beep.args[0].label_for("13"), "Pin 13");

    let playing = ext.lookup("buzzer_playing").unwrap();
    assert_eq!(playing.style.colour, "#000000");
}

#[test]
fn declarative_templates_interpolate_fields() {
    let ext = load_str(BUZZER).unwrap();
    let program = generate_program(
        &ext,
        &[
            BlockInstance::new("buzzer_beep").field("pin", "12").field("ms", "250"),
            BlockInstance::new("buzzer_beep").field("pin", "13").field("ms", "50"),
            BlockInstance::new("buzzer_beep").field("pin", "12").field("ms", "10"),
        ],
    )
    .unwrap();
    assert_eq!(
        program.source,
        "import buzzer\n\
         buzzer.attach(12)\n\
         buzzer.attach(13)\n\
         buzzer.beep(12, 250)\n\
         buzzer.beep(13, 50)\n\
         buzzer.beep(12, 10)\n"
    );

    let mut ctx = GenerationContext::new();
    let fragment = ext
        .generate("buzzer_playing", &FieldValues::new(), &mut ctx)
        .unwrap();
    assert_eq!(
        fragment,
        CodeFragment::expression("buzzer.playing() or {}", Order::LogicalOr)
    );
}

#[test]
fn toml_syntax_error_has_span() {
    let source = "[extension\nname = 1";
    let errors = load_errors(source);
    assert_eq!(errors.len(), 1);
    assert!(!errors[0].message.is_empty());
    assert!(errors[0].span.start <= source.len());
}

#[test]
fn duplicate_block_ids_reported() {
    let source = r##"
[extension]
name = "Dup"

[[block]]
id = "a"
shape = "statement"
template = { statement = "a()" }

[[block]]
id = "a"
shape = "statement"
template = { statement = "b()" }
"##;
    let errors = load_errors(source);
    assert_eq!(messages(&errors), vec!["duplicate block id `a`".to_string()]);
    let second_block = source.rfind("[[block]]").unwrap();
    assert!(errors[0].span.start > second_block);
}

#[test]
fn all_block_problems_collected() {
    let source = r##"
[extension]
name = "Broken"
toolbox = ["missing"]

[[block]]
id = "slots"
message = "needs %1"
shape = "statement"
template = { statement = "x()" }

[[block]]
id = "form"
shape = "expression"
template = { statement = "y()" }

[[block]]
id = "reads"
shape = "expression"
template = { expression = "read({pin})" }

[[block]]
id = "braces"
shape = "statement"
template = { statement = "f({x)" }

[[block]]
id = "order"
shape = "expression"
template = { expression = "z", order = "tightest" }
"##;
    let msgs = messages(&load_errors(source));
    assert_eq!(msgs.len(), 6, "{:#?}", msgs);
    assert!(msgs[0].contains("do not match 0 argument(s)"));
    assert!(msgs[1].contains("wrong form"));
    assert!(msgs[2].contains("undeclared field `pin`"));
    assert!(msgs[3].contains("malformed template"));
    assert!(msgs[4].contains("unknown precedence order: tightest"));
    assert!(msgs[5].contains("unknown block `missing`"));
}

#[test]
fn arg_defaults_are_type_checked() {
    let source = r##"
[extension]
name = "Defaults"

[[block]]
id = "wait"
message = "wait %1"
shape = "statement"
arg = [{ name = "ms", kind = "number", default = "soon" }]
template = { statement = "sleep_ms({ms})" }
"##;
    let msgs = messages(&load_errors(source));
    assert_eq!(msgs.len(), 1);
    assert!(msgs[0].contains("needs a numeric default, got string"));
}

#[test]
fn template_needs_exactly_one_form() {
    let source = r##"
[extension]
name = "Forms"

[[block]]
id = "both"
shape = "statement"
template = { statement = "a()", expression = "b()" }
"##;
    let msgs = messages(&load_errors(source));
    assert_eq!(
        msgs,
        vec!["template needs exactly one of `statement` or `expression`".to_string()]
    );
}

#[test]
fn definitions_are_key_line_tables() {
    let source = r##"
[extension]
name = "Defs"

[[block]]
id = "tone"
shape = "statement"
template = { statement = "tone()", definitions = { import_tone = "import tone" } }
"##;
    let errors = load_errors(source);
    assert_eq!(errors.len(), 1);
    assert!(errors[0].span.start < source.len());

    let fixed = source.replace(
        "definitions = { import_tone = \"import tone\" }",
        "definitions = [{ key = \"import_tone\", line = \"import tone\" }]",
    );
    let ext = load_str(&fixed).unwrap();
    let program = generate_program(&ext, &[BlockInstance::new("tone")]).unwrap();
    assert_eq!(program.source, "import tone\ntone()\n");
}

#[test]
fn diagnostics_carry_file_id_and_notes() {
    let source = r##"
[extension]
name = "Note"

[[block]]
id = "brace"
shape = "statement"
template = { statement = "oops }" }
"##;
    let errors = match Loader::new(source.to_string(), 7).load() {
        Ok(_) => panic!("expected load errors"),
        Err(errors) => errors,
    };
    let diagnostic = errors[0].to_diagnostic();
    assert_eq!(diagnostic.labels[0].file_id, 7);
    assert_eq!(diagnostic.notes.len(), 1);
    assert!(diagnostic.notes[0].contains("at byte 5"));
}
