// Built-in disassembler: renders a class file as a readable bytecode listing

use std::fmt::Write as _;
use std::path::Path;

use super::classfile::{
    AccessFlags, ByteReader, ClassFile, ClassFormatError, ClassResult, Code, ConstantPool,
    FlagTarget, Member,
};
use super::opcodes::{self, Operands};
use super::{Disassembler, DisassemblyFailure};

/// Pure Rust disassembler; needs no JDK.
#[derive(Debug, Clone, Copy, Default)]
pub struct NativeDisassembler;

impl Disassembler for NativeDisassembler {
    fn name(&self) -> &'static str {
        "native"
    }

    fn disassemble(&self, _class_file: &Path, bytes: &[u8]) -> Result<String, DisassemblyFailure> {
        let class = ClassFile::parse(bytes)?;
        Ok(render_class(&class)?)
    }
}

pub fn render_class(class: &ClassFile) -> ClassResult<String> {
    let mut out = String::new();

    let _ = writeln!(
        out,
        "// class version {}.{} ({})",
        class.major_version, class.minor_version, class.major_version
    );
    let _ = writeln!(out, "// access flags {:#06x}", class.access);

    let kind = if class.is_interface() { "interface" } else { "class" };
    let _ = write!(
        out,
        "{}{} {}",
        AccessFlags {
            flags: class.access,
            target: FlagTarget::Class,
        },
        kind,
        class.this_class
    );
    if let Some(super_class) = &class.super_class {
        let _ = write!(out, " extends {}", super_class);
    }
    if !class.interfaces.is_empty() {
        let _ = write!(out, " implements {}", class.interfaces.join(" "));
    }
    out.push_str(" {\n");

    if let Some(source) = class.source_file() {
        let _ = writeln!(out, "\n  // compiled from: {}", source);
    }

    for field in &class.fields {
        render_field(&mut out, field, &class.pool)?;
    }
    for method in &class.methods {
        render_method(&mut out, method, &class.pool)?;
    }

    out.push_str("}\n");
    Ok(out)
}

fn render_field(out: &mut String, field: &Member, pool: &ConstantPool) -> ClassResult<()> {
    let _ = writeln!(out, "\n  // access flags {:#06x}", field.access);
    let _ = write!(
        out,
        "  {}{} {}",
        AccessFlags {
            flags: field.access,
            target: FlagTarget::Field,
        },
        field.descriptor,
        field.name
    );
    if let Some(value) = field.attribute("ConstantValue") {
        let index = ByteReader::new(&value.data).u2()?;
        let _ = write!(out, " = {}", pool.render(index)?);
    }
    out.push('\n');
    render_signature(out, field, pool, "  ")
}

fn render_method(out: &mut String, method: &Member, pool: &ConstantPool) -> ClassResult<()> {
    let _ = writeln!(out, "\n  // access flags {:#06x}", method.access);
    let _ = writeln!(
        out,
        "  {}{}{}",
        AccessFlags {
            flags: method.access,
            target: FlagTarget::Method,
        },
        method.name,
        method.descriptor
    );
    render_signature(out, method, pool, "    ")?;

    if let Some(exceptions) = method.attribute("Exceptions") {
        let mut reader = ByteReader::new(&exceptions.data);
        let count = reader.u2()?;
        for _ in 0..count {
            let _ = writeln!(out, "    throws {}", pool.class_name(reader.u2()?)?);
        }
    }

    if let Some(code) = method.attribute("Code") {
        let code = Code::parse(&code.data, pool)?;
        render_code(out, &code, pool)?;
    }
    Ok(())
}

fn render_signature(
    out: &mut String,
    member: &Member,
    pool: &ConstantPool,
    indent: &str,
) -> ClassResult<()> {
    if let Some(signature) = member.attribute("Signature") {
        let index = ByteReader::new(&signature.data).u2()?;
        let _ = writeln!(out, "{}// signature {}", indent, pool.utf8(index)?);
    }
    Ok(())
}

fn render_code(out: &mut String, code: &Code, pool: &ConstantPool) -> ClassResult<()> {
    let mut reader = ByteReader::new(&code.bytecode);

    while !reader.is_empty() {
        let pc = reader.position();
        let opcode = reader.u1()?;
        let name = opcodes::mnemonic(opcode).ok_or_else(|| ClassFormatError::BadCode {
            offset: pc,
            reason: format!("unknown opcode {:#04x}", opcode),
        })?;

        let _ = write!(out, "    {:>5}: {}", pc, name);
        render_operands(out, &mut reader, opcode, pc, pool)?;
        out.push('\n');
    }

    for handler in &code.handlers {
        let _ = writeln!(
            out,
            "    TRYCATCHBLOCK {} {} {} {}",
            handler.start,
            handler.end,
            handler.handler,
            handler.catch_type.as_deref().unwrap_or("null")
        );
    }
    let _ = writeln!(out, "    MAXSTACK = {}", code.max_stack);
    let _ = writeln!(out, "    MAXLOCALS = {}", code.max_locals);
    Ok(())
}

fn branch_target(pc: usize, offset: i64) -> i64 {
    pc as i64 + offset
}

fn render_operands(
    out: &mut String,
    reader: &mut ByteReader<'_>,
    opcode: u8,
    pc: usize,
    pool: &ConstantPool,
) -> ClassResult<()> {
    match opcodes::operands(opcode) {
        Operands::None => {}
        Operands::Byte => {
            let _ = write!(out, " {}", reader.i1()?);
        }
        Operands::Short => {
            let _ = write!(out, " {}", reader.i2()?);
        }
        Operands::Local => {
            let _ = write!(out, " {}", reader.u1()?);
        }
        Operands::Constant1 => {
            let index = reader.u1()? as u16;
            let _ = write!(out, " {}", pool.render(index)?);
        }
        Operands::Constant2 => {
            let index = reader.u2()?;
            let _ = write!(out, " {}", pool.render(index)?);
        }
        Operands::Branch2 => {
            let offset = reader.i2()? as i64;
            let _ = write!(out, " {}", branch_target(pc, offset));
        }
        Operands::Branch4 => {
            let offset = reader.i4()? as i64;
            let _ = write!(out, " {}", branch_target(pc, offset));
        }
        Operands::Iinc => {
            let local = reader.u1()?;
            let delta = reader.i1()?;
            let _ = write!(out, " {} {}", local, delta);
        }
        Operands::InvokeInterface => {
            let index = reader.u2()?;
            let count = reader.u1()?;
            reader.skip(1)?;
            let _ = write!(out, " {} (itf, {} args)", pool.render(index)?, count);
        }
        Operands::InvokeDynamic => {
            let index = reader.u2()?;
            reader.skip(2)?;
            let _ = write!(out, " {}", pool.render(index)?);
        }
        Operands::ArrayType => {
            let _ = write!(out, " {}", opcodes::array_type(reader.u1()?));
        }
        Operands::MultiANewArray => {
            let index = reader.u2()?;
            let dimensions = reader.u1()?;
            let _ = write!(out, " {} {}", pool.render(index)?, dimensions);
        }
        Operands::Switch => render_switch(out, reader, opcode, pc)?,
        Operands::Wide => {
            let widened = reader.u1()?;
            let name = opcodes::mnemonic(widened).unwrap_or("?");
            let local = reader.u2()?;
            if widened == opcodes::IINC {
                let delta = reader.i2()?;
                let _ = write!(out, " {} {} {}", name, local, delta);
            } else if opcodes::operands(widened) == Operands::Local {
                let _ = write!(out, " {} {}", name, local);
            } else {
                return Err(ClassFormatError::BadCode {
                    offset: pc,
                    reason: format!("wide cannot modify {}", name),
                });
            }
        }
    }
    Ok(())
}

fn render_switch(
    out: &mut String,
    reader: &mut ByteReader<'_>,
    opcode: u8,
    pc: usize,
) -> ClassResult<()> {
    // Operands start on the next four-byte boundary of the code array.
    let padding = (4 - (pc + 1) % 4) % 4;
    reader.skip(padding)?;
    let default = branch_target(pc, reader.i4()? as i64);

    if opcode == opcodes::TABLESWITCH {
        let low = reader.i4()?;
        let high = reader.i4()?;
        if high < low {
            return Err(ClassFormatError::BadCode {
                offset: pc,
                reason: format!("tableswitch high {} below low {}", high, low),
            });
        }
        let _ = write!(out, " {{ // {} to {}", low, high);
        for key in low as i64..=high as i64 {
            let target = branch_target(pc, reader.i4()? as i64);
            let _ = write!(out, "\n      {:>8}: {}", key, target);
        }
    } else {
        let pairs = reader.i4()?;
        if pairs < 0 {
            return Err(ClassFormatError::BadCode {
                offset: pc,
                reason: format!("lookupswitch with {} pairs", pairs),
            });
        }
        let _ = write!(out, " {{ // {}", pairs);
        for _ in 0..pairs {
            let key = reader.i4()?;
            let target = branch_target(pc, reader.i4()? as i64);
            let _ = write!(out, "\n      {:>8}: {}", key, target);
        }
    }
    let _ = write!(out, "\n       default: {}\n    }}", default);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::disassemble::classfile::fixtures;

    fn listing(code: &[u8]) -> ClassResult<String> {
        let mut out = String::new();
        let code = Code {
            max_stack: 2,
            max_locals: 1,
            bytecode: code.to_vec(),
            handlers: Vec::new(),
            attributes: Vec::new(),
        };
        render_code(&mut out, &code, &ConstantPool::default())?;
        Ok(out)
    }

    #[test]
    fn test_demo_class_listing() {
        let text = NativeDisassembler
            .disassemble(Path::new("Demo.class"), &fixtures::demo_class())
            .unwrap();

        assert!(text.starts_with("// class version 52.0 (52)"), "{}", text);
        assert!(text.contains("public class com/example/Demo extends java/lang/Object {"));
        assert!(text.contains("// compiled from: Demo.java"));
        assert!(text.contains("  private I count"));
        assert!(text.contains("  public <init>()V"));
        assert!(text.contains("0: aload_0"));
        assert!(text.contains("1: invokespecial java/lang/Object.<init> ()V"));
        assert!(text.contains("4: return"));
        assert!(text.contains("MAXSTACK = 1"));
        assert!(text.trim_end().ends_with('}'));
    }

    #[test]
    fn test_branches_and_immediates() {
        // 0: iconst_0, 1: istore_0, 2: iinc 0 1, 5: iload_0, 6: bipush -3, 8: if_icmplt -6, 11: return
        let text = listing(&[0x03, 0x3b, 0x84, 0x00, 0x01, 0x1a, 0x10, 0xfd, 0xa1, 0xff, 0xfa, 0xb1])
            .unwrap();
        assert!(text.contains("2: iinc 0 1"), "{}", text);
        assert!(text.contains("6: bipush -3"), "{}", text);
        assert!(text.contains("8: if_icmplt 2"), "{}", text);
        assert!(text.contains("11: return"), "{}", text);
    }

    #[test]
    fn test_tableswitch_alignment() {
        // 0: iload_0, 1: tableswitch (2 padding bytes), default +20, cases 0..1
        let mut code = vec![0x1a, 0xaa, 0x00, 0x00];
        for value in [20i32, 0, 1, 19, 20] {
            code.extend_from_slice(&value.to_be_bytes());
        }
        code.push(0xb1);
        let text = listing(&code).unwrap();
        assert!(text.contains("1: tableswitch { // 0 to 1"), "{}", text);
        assert!(text.contains("0: 20"), "{}", text);
        assert!(text.contains("default: 21"), "{}", text);
        assert!(text.contains("24: return"), "{}", text);
    }

    #[test]
    fn test_wide_iinc() {
        let text = listing(&[0xc4, 0x84, 0x01, 0x00, 0x03, 0xe8, 0xb1]).unwrap();
        assert!(text.contains("0: wide iinc 256 1000"), "{}", text);
        assert!(text.contains("6: return"), "{}", text);
    }

    #[test]
    fn test_unknown_opcode_is_rejected() {
        let err = listing(&[0xcb]).unwrap_err();
        assert!(matches!(err, ClassFormatError::BadCode { offset: 0, .. }));
    }

    #[test]
    fn test_truncated_operand_is_rejected() {
        assert!(matches!(
            listing(&[0x11, 0x00]).unwrap_err(),
            ClassFormatError::Truncated { .. }
        ));
    }

    #[test]
    fn test_rejects_non_class_bytes() {
        let err = NativeDisassembler
            .disassemble(Path::new("Bad.class"), b"definitely not bytecode")
            .unwrap_err();
        assert!(err.to_string().contains("not a class file"), "{}", err);
    }
}
