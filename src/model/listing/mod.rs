/// The term "listing" is used to refer to the representation of a decompiled unit that the user interacts with, which
/// is a grid of rows containing tokens.

/// The grid module turns the flat token stream the decompiler produces into rows and columns. Columns are not cells;
/// a token occupies the column at which it starts and the next token starts after its text. The host viewer never
/// addresses columns directly, it asks for positions that may not exist and the grid resolves them to the nearest real
/// token.

/// The place module is used to describe the cursor the host viewer stores, compares, and persists.

pub mod grid;
pub mod line;
pub mod place;
pub mod position;
pub mod token;
