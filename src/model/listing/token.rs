use crate::model::addr;

/// Control characters the host's colorized text renderer understands.
pub const COLOR_ON: char = '\x01';
pub const COLOR_OFF: char = '\x02';

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum TokenKind {
    NewLine,
    Whitespace,
    Punctuation,
    Operator,
    GlobalVariable,
    Member,
    Label,
    Function,
    Parameter,
    LocalVariable,
    Keyword,
    Type,
    Preprocessor,
    Include,
    BoolLiteral,
    IntLiteral,
    FloatLiteral,
    StringLiteral,
    SymbolLiteral,
    PointerLiteral,
    Comment,
}

/// Display color of a token. The discriminant is the tag byte the host's
/// renderer expects after [COLOR_ON] and [COLOR_OFF].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ColorClass {
    Default = 0x01,
    AutoComment = 0x04,
    DataName = 0x06,
    Symbol = 0x09,
    Char = 0x0a,
    String = 0x0b,
    Number = 0x0c,
    LocalName = 0x19,
    CodeName = 0x1a,
    Macro = 0x1c,
    Keyword = 0x20,
    Register = 0x21,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub address: addr::Address,
    pub text: String,
    pub color: ColorClass,
}

impl TokenKind {
    /// The short names the decompiler uses in its JSON output.
    pub fn from_json_name(name: &str) -> Option<TokenKind> {
        Some(match name {
            "nl" => TokenKind::NewLine,
            "ws" => TokenKind::Whitespace,
            "punc" => TokenKind::Punctuation,
            "op" => TokenKind::Operator,
            "i_var" => TokenKind::GlobalVariable,
            "i_mem" => TokenKind::Member,
            "i_lab" => TokenKind::Label,
            "i_fnc" => TokenKind::Function,
            "i_arg" => TokenKind::Parameter,
            "i_lvar" => TokenKind::LocalVariable,
            "keyw" => TokenKind::Keyword,
            "type" => TokenKind::Type,
            "preproc" => TokenKind::Preprocessor,
            "inc" => TokenKind::Include,
            "l_bool" => TokenKind::BoolLiteral,
            "l_int" => TokenKind::IntLiteral,
            "l_fp" => TokenKind::FloatLiteral,
            "l_str" => TokenKind::StringLiteral,
            "l_sym" => TokenKind::SymbolLiteral,
            "l_ptr" => TokenKind::PointerLiteral,
            "cmnt" => TokenKind::Comment,
            _ => return None,
        })
    }

    pub fn color(&self) -> ColorClass {
        match self {
            TokenKind::NewLine | TokenKind::Whitespace => ColorClass::Default,
            TokenKind::Punctuation | TokenKind::Operator => ColorClass::Symbol,
            TokenKind::GlobalVariable => ColorClass::DataName,
            TokenKind::Member => ColorClass::Default,
            TokenKind::Label => ColorClass::LocalName,
            TokenKind::Function => ColorClass::CodeName,
            TokenKind::Parameter => ColorClass::Register,
            TokenKind::LocalVariable => ColorClass::Default,
            TokenKind::Keyword | TokenKind::Type => ColorClass::Keyword,
            TokenKind::Preprocessor | TokenKind::Include => ColorClass::Macro,
            TokenKind::BoolLiteral
                | TokenKind::IntLiteral
                | TokenKind::FloatLiteral
                | TokenKind::PointerLiteral => ColorClass::Number,
            TokenKind::StringLiteral => ColorClass::String,
            TokenKind::SymbolLiteral => ColorClass::Char,
            TokenKind::Comment => ColorClass::AutoComment,
        }
    }
}

impl ColorClass {
    pub fn tag(&self) -> char {
        *self as u8 as char
    }
}

impl Token {
    pub fn new(kind: TokenKind, address: addr::Address, text: impl Into<String>) -> Token {
        let text = match kind {
            /* newlines terminate a row and contribute no visible text */
            TokenKind::NewLine => String::new(),
            _ => text.into(),
        };

        Token {
            kind,
            address,
            text,
            color: kind.color(),
        }
    }

    pub fn newline(address: addr::Address) -> Token {
        Token::new(TokenKind::NewLine, address, "")
    }

    pub fn is_newline(&self) -> bool {
        self.kind == TokenKind::NewLine
    }

    /// Number of columns this token occupies.
    pub fn width(&self) -> usize {
        self.text.chars().count()
    }

    /// Same token with different text, keeping kind and address.
    pub fn with_text(&self, text: impl Into<String>) -> Token {
        Token::new(self.kind, self.address, text)
    }

    pub fn write_markup(&self, out: &mut String) {
        out.push(COLOR_ON);
        out.push(self.color.tag());
        out.push_str(&self.text);
        out.push(COLOR_OFF);
        out.push(self.color.tag());
    }
}
