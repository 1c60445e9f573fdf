//! AvailableCommands: the server's command table.

use bds_protocol::{Cursor, Decode, Result};
use byteorder::LittleEndian;
use serde::Serialize;

const SYMBOL_VALID: u32 = 0x10_0000;
const SYMBOL_ENUM: u32 = 0x20_0000;
const SYMBOL_POSTFIX: u32 = 0x100_0000;
const SYMBOL_SOFT_ENUM: u32 = 0x400_0000;
const SYMBOL_INDEX_MASK: u32 = 0xFFFF;

/// An enum whose values are indexes into the shared value table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandEnum {
    pub name: String,
    pub value_indexes: Vec<u32>,
}

impl CommandEnum {
    /// Index width depends on how many enum values the packet carries.
    fn decode_with(cursor: &mut Cursor<'_>, value_count: usize) -> Result<Self> {
        cursor.transaction(|c| {
            let name = c.read_string()?;
            let value_indexes = if value_count <= 0x100 {
                c.read_var_array(|c| c.read_u8().map(u32::from))?
            } else if value_count <= 0x1_0000 {
                c.read_var_array(|c| c.read_u16::<LittleEndian>().map(u32::from))?
            } else {
                c.read_var_array(Cursor::read_u32::<LittleEndian>)?
            };
            Ok(Self {
                name,
                value_indexes,
            })
        })
    }

    /// Resolve indexes against the packet's value table.
    #[must_use]
    pub fn values<'a>(&self, table: &'a [String]) -> Vec<Option<&'a str>> {
        self.value_indexes
            .iter()
            .map(|&i| table.get(i as usize).map(String::as_str))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct ChainedSubcommandValue {
    pub index: u16,
    pub value: u16,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct ChainedSubcommand {
    pub name: String,
    pub values: Vec<ChainedSubcommandValue>,
}

/// Parameter type word: a base type or table index plus flag bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Decode)]
#[serde(transparent)]
pub struct ParamSymbol(pub u32);

impl ParamSymbol {
    #[must_use]
    pub const fn index(self) -> u32 {
        self.0 & SYMBOL_INDEX_MASK
    }

    #[must_use]
    pub const fn is_valid(self) -> bool {
        self.0 & SYMBOL_VALID != 0
    }

    #[must_use]
    pub const fn is_enum(self) -> bool {
        self.0 & SYMBOL_ENUM != 0
    }

    #[must_use]
    pub const fn is_soft_enum(self) -> bool {
        self.0 & SYMBOL_SOFT_ENUM != 0
    }

    #[must_use]
    pub const fn is_postfix(self) -> bool {
        self.0 & SYMBOL_POSTFIX != 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct CommandParameter {
    pub name: String,
    pub symbol: ParamSymbol,
    pub optional: bool,
    pub options: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct CommandOverload {
    pub chaining: bool,
    pub parameters: Vec<CommandParameter>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct Command {
    pub name: String,
    pub description: String,
    pub flags: u16,
    pub permission_level: u8,
    /// Index into `enums`, or -1 for no aliases.
    pub alias_enum: i32,
    pub chained_subcommand_indexes: Vec<u16>,
    pub overloads: Vec<CommandOverload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct SoftEnum {
    pub name: String,
    pub values: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Decode)]
pub struct EnumConstraint {
    pub value_index: u32,
    pub enum_index: u32,
    pub constraints: Vec<u8>,
}

/// AvailableCommands (ID: 76)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AvailableCommands {
    pub enum_values: Vec<String>,
    pub chained_subcommand_values: Vec<String>,
    pub postfixes: Vec<String>,
    pub enums: Vec<CommandEnum>,
    pub chained_subcommands: Vec<ChainedSubcommand>,
    pub commands: Vec<Command>,
    pub soft_enums: Vec<SoftEnum>,
    pub constraints: Vec<EnumConstraint>,
}

impl Decode for AvailableCommands {
    fn decode(cursor: &mut Cursor<'_>) -> Result<Self> {
        cursor.transaction(|c| {
            let enum_values: Vec<String> = Vec::decode(c)?;
            let chained_subcommand_values = Vec::decode(c)?;
            let postfixes = Vec::decode(c)?;
            let value_count = enum_values.len();
            let enums = c.read_var_array(|c| CommandEnum::decode_with(c, value_count))?;
            Ok(Self {
                enum_values,
                enums,
                chained_subcommand_values,
                postfixes,
                chained_subcommands: Vec::decode(c)?,
                commands: Vec::decode(c)?,
                soft_enums: Vec::decode(c)?,
                constraints: Vec::decode(c)?,
            })
        })
    }
}

impl AvailableCommands {
    #[must_use]
    pub fn command(&self, name: &str) -> Option<&Command> {
        self.commands.iter().find(|command| command.name == name)
    }

    /// Alias names of a command, resolved through its alias enum.
    #[must_use]
    pub fn aliases(&self, command: &Command) -> Vec<&str> {
        usize::try_from(command.alias_enum)
            .ok()
            .and_then(|i| self.enums.get(i))
            .map(|e| e.values(&self.enum_values).into_iter().flatten().collect())
            .unwrap_or_default()
    }
}
