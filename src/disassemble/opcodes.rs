// JVM instruction set: mnemonics and operand layouts

pub const TABLESWITCH: u8 = 0xaa;
pub const LOOKUPSWITCH: u8 = 0xab;
pub const WIDE: u8 = 0xc4;
pub const IINC: u8 = 0x84;

const MNEMONICS: [&str; 202] = [
    "nop", "aconst_null", "iconst_m1", "iconst_0", "iconst_1", "iconst_2", "iconst_3",
    "iconst_4", "iconst_5", "lconst_0", "lconst_1", "fconst_0", "fconst_1", "fconst_2",
    "dconst_0", "dconst_1", "bipush", "sipush", "ldc", "ldc_w", "ldc2_w", "iload", "lload",
    "fload", "dload", "aload", "iload_0", "iload_1", "iload_2", "iload_3", "lload_0",
    "lload_1", "lload_2", "lload_3", "fload_0", "fload_1", "fload_2", "fload_3", "dload_0",
    "dload_1", "dload_2", "dload_3", "aload_0", "aload_1", "aload_2", "aload_3", "iaload",
    "laload", "faload", "daload", "aaload", "baload", "caload", "saload", "istore", "lstore",
    "fstore", "dstore", "astore", "istore_0", "istore_1", "istore_2", "istore_3", "lstore_0",
    "lstore_1", "lstore_2", "lstore_3", "fstore_0", "fstore_1", "fstore_2", "fstore_3",
    "dstore_0", "dstore_1", "dstore_2", "dstore_3", "astore_0", "astore_1", "astore_2",
    "astore_3", "iastore", "lastore", "fastore", "dastore", "aastore", "bastore", "castore",
    "sastore", "pop", "pop2", "dup", "dup_x1", "dup_x2", "dup2", "dup2_x1", "dup2_x2", "swap",
    "iadd", "ladd", "fadd", "dadd", "isub", "lsub", "fsub", "dsub", "imul", "lmul", "fmul",
    "dmul", "idiv", "ldiv", "fdiv", "ddiv", "irem", "lrem", "frem", "drem", "ineg", "lneg",
    "fneg", "dneg", "ishl", "lshl", "ishr", "lshr", "iushr", "lushr", "iand", "land", "ior",
    "lor", "ixor", "lxor", "iinc", "i2l", "i2f", "i2d", "l2i", "l2f", "l2d", "f2i", "f2l",
    "f2d", "d2i", "d2l", "d2f", "i2b", "i2c", "i2s", "lcmp", "fcmpl", "fcmpg", "dcmpl",
    "dcmpg", "ifeq", "ifne", "iflt", "ifge", "ifgt", "ifle", "if_icmpeq", "if_icmpne",
    "if_icmplt", "if_icmpge", "if_icmpgt", "if_icmple", "if_acmpeq", "if_acmpne", "goto",
    "jsr", "ret", "tableswitch", "lookupswitch", "ireturn", "lreturn", "freturn", "dreturn",
    "areturn", "return", "getstatic", "putstatic", "getfield", "putfield", "invokevirtual",
    "invokespecial", "invokestatic", "invokeinterface", "invokedynamic", "new", "newarray",
    "anewarray", "arraylength", "athrow", "checkcast", "instanceof", "monitorenter",
    "monitorexit", "wide", "multianewarray", "ifnull", "ifnonnull", "goto_w", "jsr_w",
];

pub fn mnemonic(opcode: u8) -> Option<&'static str> {
    match opcode {
        0xca => Some("breakpoint"),
        0xfe => Some("impdep1"),
        0xff => Some("impdep2"),
        _ => MNEMONICS.get(opcode as usize).copied(),
    }
}

/// Operand layout following an opcode byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operands {
    None,
    /// Signed byte immediate (`bipush`).
    Byte,
    /// Signed short immediate (`sipush`).
    Short,
    /// One-byte local variable index.
    Local,
    /// One-byte constant pool index (`ldc`).
    Constant1,
    /// Two-byte constant pool index.
    Constant2,
    /// Two-byte signed branch offset.
    Branch2,
    /// Four-byte signed branch offset.
    Branch4,
    /// Local index and signed increment.
    Iinc,
    /// Constant pool index, argument count and a zero byte.
    InvokeInterface,
    /// Constant pool index and two zero bytes.
    InvokeDynamic,
    /// Primitive array type code.
    ArrayType,
    /// Constant pool index and dimension count.
    MultiANewArray,
    /// Variable length, decoded by the printer.
    Switch,
    Wide,
}

pub fn operands(opcode: u8) -> Operands {
    match opcode {
        0x10 => Operands::Byte,
        0x11 => Operands::Short,
        0x12 => Operands::Constant1,
        0x13 | 0x14 => Operands::Constant2,
        0x15..=0x19 | 0x36..=0x3a | 0xa9 => Operands::Local,
        IINC => Operands::Iinc,
        0x99..=0xa8 | 0xc6 | 0xc7 => Operands::Branch2,
        0xc8 | 0xc9 => Operands::Branch4,
        TABLESWITCH | LOOKUPSWITCH => Operands::Switch,
        0xb2..=0xb8 | 0xbb | 0xbd | 0xc0 | 0xc1 => Operands::Constant2,
        0xb9 => Operands::InvokeInterface,
        0xba => Operands::InvokeDynamic,
        0xbc => Operands::ArrayType,
        WIDE => Operands::Wide,
        0xc5 => Operands::MultiANewArray,
        _ => Operands::None,
    }
}

pub fn array_type(code: u8) -> &'static str {
    match code {
        4 => "boolean",
        5 => "char",
        6 => "float",
        7 => "double",
        8 => "byte",
        9 => "short",
        10 => "int",
        11 => "long",
        _ => "?",
    }
}
