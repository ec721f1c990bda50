#![no_std]

/// Cell value marking an empty position in a flat row-major board.
pub const EMPTY: u8 = 0;

/// Counts the non-empty cells of a flat board.
pub fn count_blocks(board: &[u8]) -> usize {
    board.iter().filter(|&&cell| cell != EMPTY).count()
}

/// Returns true if every cell of column `col` is empty.
pub fn column_is_empty(board: &[u8], width: usize, height: usize, col: usize) -> bool {
    (0..height).all(|row| board[row * width + col] == EMPTY)
}

/// Lets the non-empty cells of one column fall to the bottom row.
///
/// Relative order inside the column is preserved; other columns are untouched.
///
/// # Arguments
/// * `board` - The board data as a flat row-major slice (row 0 is the top)
/// * `width` - Board width
/// * `height` - Board height
/// * `col` - The column to settle
///
/// # Returns
/// true if at least one cell moved
pub fn settle_column(board: &mut [u8], width: usize, height: usize, col: usize) -> bool {
    let mut moved = false;
    let mut write = height;
    for row in (0..height).rev() {
        let value = board[row * width + col];
        if value == EMPTY {
            continue;
        }
        write -= 1;
        if write != row {
            board[write * width + col] = value;
            board[row * width + col] = EMPTY;
            moved = true;
        }
    }
    moved
}

/// Settles every column of the board.
pub fn settle(board: &mut [u8], width: usize, height: usize) -> bool {
    let mut moved = false;
    for col in 0..width {
        moved |= settle_column(board, width, height, col);
    }
    moved
}

/// Shifts non-empty columns left so that empty columns end up on the right.
///
/// Column contents and the left-to-right order of occupied columns are kept.
///
/// # Returns
/// The number of occupied columns
pub fn compact_columns(board: &mut [u8], width: usize, height: usize) -> usize {
    let mut target = 0;
    for col in 0..width {
        if column_is_empty(board, width, height, col) {
            continue;
        }
        if target != col {
            for row in 0..height {
                board[row * width + target] = board[row * width + col];
                board[row * width + col] = EMPTY;
            }
        }
        target += 1;
    }
    target
}
