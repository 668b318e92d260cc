//! Builders shared by the unit tests.

use crate::metadata::{tables::MetadataTables, token::Token};

/// Assembles raw IL for tests.
#[derive(Default)]
pub struct CodeBuilder {
    code: Vec<u8>,
}

impl CodeBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Opcode without operand; two-byte codes are written with their escape byte.
    pub fn op(mut self, code: u16) -> Self {
        if code > 0xFF {
            self.code.extend_from_slice(&code.to_be_bytes());
        } else {
            self.code.push(code as u8);
        }
        self
    }

    /// Opcode followed by a token.
    pub fn token(self, code: u16, token: Token) -> Self {
        self.op(code).bytes(&token.value().to_le_bytes())
    }

    /// Raw operand bytes.
    pub fn bytes(mut self, bytes: &[u8]) -> Self {
        self.code.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.code
    }
}

/// A small module: `Demo.Program` with `Main`, a `count` field, a `WriteLine` reference and the
/// literal `"hello"`.
pub struct SampleModule {
    pub tables: MetadataTables,
    pub program: Token,
    pub main: Token,
    pub count: Token,
    pub write_line: Token,
    pub hello: Token,
}

impl SampleModule {
    pub fn new() -> Self {
        let mut tables = MetadataTables::new();
        let program = tables.add_type_def("Demo", "Program").unwrap();
        let main = tables.add_method_def("Main").unwrap();
        let count = tables.add_field("count").unwrap();
        let write_line = tables.add_member_ref("WriteLine").unwrap();
        let hello = tables.add_user_string("hello").unwrap();

        SampleModule {
            tables,
            program,
            main,
            count,
            write_line,
            hello,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_layout() {
        let code = CodeBuilder::new()
            .op(0x00)
            .op(0xFE01)
            .token(0x72, Token(0x7000_0001))
            .bytes(&[0x2A])
            .build();

        assert_eq!(code, [0x00, 0xFE, 0x01, 0x72, 0x01, 0x00, 0x00, 0x70, 0x2A]);
    }
}
