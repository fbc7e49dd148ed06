use crate::bits::SquareSet;
use arrayvec::ArrayVec;
use std::collections::VecDeque;
use std::fmt;

pub const MAX_BOARD_SIZE: usize = 64;
pub const NO_BOX: u16 = u16::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
    Goal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

pub const ALL_DIRECTIONS: [Direction; 4] = [
    Direction::Up,
    Direction::Right,
    Direction::Down,
    Direction::Left,
];

impl Direction {
    pub fn reverse(&self) -> Direction {
        match self {
            Direction::Up => Direction::Down,
            Direction::Right => Direction::Left,
            Direction::Down => Direction::Up,
            Direction::Left => Direction::Right,
        }
    }

    /// Grid delta in (x, y) coordinates, independent of any board width.
    pub fn delta(&self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    pub fn walk_char(&self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Right => 'r',
            Direction::Down => 'd',
            Direction::Left => 'l',
        }
    }

    pub fn push_char(&self) -> char {
        self.walk_char().to_ascii_uppercase()
    }

    /// Parse one LURD character. Returns the direction and whether the move
    /// is a push (uppercase). Any other character yields `None`.
    pub fn from_lurd_char(ch: char) -> Option<(Direction, bool)> {
        let direction = match ch.to_ascii_lowercase() {
            'u' => Direction::Up,
            'r' => Direction::Right,
            'd' => Direction::Down,
            'l' => Direction::Left,
            _ => return None,
        };
        Some((direction, ch.is_ascii_uppercase()))
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Right => write!(f, "Right"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
        }
    }
}

/// A Sokoban board: static tiles, box data, and the player position.
///
/// Squares are row-major indices into a `width * height` grid. Box positions
/// are stored as `u16` both here and in the solvers' packed snapshots.
#[derive(Debug, Clone)]
pub struct Board {
    width: usize,
    height: usize,
    tiles: Box<[Tile]>,
    // Maps square to box number (NO_BOX = no box at this square)
    box_no_at: Box<[u16]>,
    box_positions: Vec<u16>,
    boxes_on_goals: usize,
    goal_positions: Vec<u16>,
    pub player_position: usize,
    reachable: SquareSet,
}

impl Board {
    /// Parse a Sokoban board from text format.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` ` = Floor (empty space)
    /// - `.` = Goal (target location for boxes)
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on goal
    /// - `+` = Player on goal
    pub fn from_text(text: &str) -> Result<Self, String> {
        let lines: Vec<&str> = text.lines().collect();

        if lines.is_empty() {
            return Err("Empty board".to_string());
        }

        let height = lines.len();
        let width = lines.iter().map(|line| line.len()).max().unwrap_or(0);

        if width > MAX_BOARD_SIZE {
            return Err(format!(
                "Board width {} exceeds maximum size {}",
                width, MAX_BOARD_SIZE
            ));
        }
        if height > MAX_BOARD_SIZE {
            return Err(format!(
                "Board height {} exceeds maximum size {}",
                height, MAX_BOARD_SIZE
            ));
        }

        let size = width * height;
        let mut board = Board {
            width,
            height,
            tiles: vec![Tile::Floor; size].into_boxed_slice(),
            box_no_at: vec![NO_BOX; size].into_boxed_slice(),
            box_positions: Vec::new(),
            boxes_on_goals: 0,
            goal_positions: Vec::new(),
            player_position: 0,
            reachable: SquareSet::new(size),
        };
        let mut player_position = None;

        for (y, line) in lines.iter().enumerate() {
            for (x, ch) in line.chars().enumerate() {
                let square = y * width + x;
                match ch {
                    '#' => board.tiles[square] = Tile::Wall,
                    ' ' => board.tiles[square] = Tile::Floor,
                    '.' => board.set_goal(square),
                    '$' => board.add_box(square as u16),
                    '*' => {
                        board.set_goal(square);
                        board.add_box(square as u16);
                    }
                    '@' | '+' => {
                        if player_position.is_some() {
                            return Err("Multiple players found".to_string());
                        }
                        player_position = Some(square);
                        if ch == '+' {
                            board.set_goal(square);
                        }
                    }
                    _ => {
                        return Err(format!(
                            "Invalid character '{}' at position ({}, {})",
                            ch, x, y
                        ));
                    }
                }
            }
        }

        board.player_position = player_position.ok_or("No player found on board")?;

        // Validate that the number of goals matches the number of boxes
        if board.goal_positions.len() != board.box_positions.len() {
            return Err(format!(
                "Goal count ({}) does not match box count ({})",
                board.goal_positions.len(),
                board.box_positions.len()
            ));
        }

        Ok(board)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn size(&self) -> usize {
        self.width * self.height
    }

    /// Square delta for each direction in this board's row-major indexing.
    pub fn offset(&self, direction: Direction) -> isize {
        match direction {
            Direction::Up => -(self.width as isize),
            Direction::Right => 1,
            Direction::Down => self.width as isize,
            Direction::Left => -1,
        }
    }

    /// The square one step from `square` in `direction`, or `None` if the
    /// step leaves the grid (including row wrap-around on the side columns).
    pub fn offset_position(&self, square: usize, direction: Direction) -> Option<usize> {
        let (dx, dy) = direction.delta();
        let x = (square % self.width) as i32 + dx;
        let y = (square / self.width) as i32 + dy;
        if x >= 0 && y >= 0 && x < self.width as i32 && y < self.height as i32 {
            Some(y as usize * self.width + x as usize)
        } else {
            None
        }
    }

    pub fn get_tile(&self, square: usize) -> Tile {
        self.tiles[square]
    }

    pub fn is_wall(&self, square: usize) -> bool {
        self.tiles[square] == Tile::Wall
    }

    pub fn is_goal(&self, square: usize) -> bool {
        self.tiles[square] == Tile::Goal
    }

    pub fn is_box(&self, square: usize) -> bool {
        self.box_no_at[square] != NO_BOX
    }

    pub fn is_box_on_goal(&self, square: usize) -> bool {
        self.is_box(square) && self.is_goal(square)
    }

    /// Whether the player may stand on `square`.
    pub fn is_accessible(&self, square: usize) -> bool {
        !self.is_wall(square) && !self.is_box(square)
    }

    /// Whether a box may be moved onto `square`.
    pub fn is_accessible_box(&self, square: usize) -> bool {
        !self.is_wall(square) && !self.is_box(square)
    }

    pub fn box_count(&self) -> usize {
        self.box_positions.len()
    }

    /// Box number at `square`, if a box is there.
    pub fn box_no_at(&self, square: usize) -> Option<usize> {
        let no = self.box_no_at[square];
        if no == NO_BOX { None } else { Some(no as usize) }
    }

    pub fn box_position(&self, box_no: usize) -> usize {
        self.box_positions[box_no] as usize
    }

    /// Snapshot of the box positions in box-number order.
    pub fn box_positions_clone(&self) -> Vec<u16> {
        self.box_positions.clone()
    }

    pub fn goal_positions(&self) -> &[u16] {
        &self.goal_positions
    }

    pub fn every_box_on_goal(&self) -> bool {
        self.boxes_on_goals == self.box_positions.len()
    }

    pub fn add_box(&mut self, square: u16) {
        assert!(
            self.box_no_at[square as usize] == NO_BOX,
            "Square {} already holds a box",
            square
        );
        self.box_no_at[square as usize] = self.box_positions.len() as u16;
        self.box_positions.push(square);
        if self.is_goal(square as usize) {
            self.boxes_on_goals += 1;
        }
    }

    pub fn remove_all_boxes(&mut self) {
        for &square in &self.box_positions {
            self.box_no_at[square as usize] = NO_BOX;
        }
        self.box_positions.clear();
        self.boxes_on_goals = 0;
    }

    /// Reinstall all boxes at the given squares, in box-number order.
    pub fn set_box_positions(&mut self, squares: &[u16]) {
        self.remove_all_boxes();
        for &square in squares {
            self.add_box(square);
        }
    }

    /// Move the box at `from` to the free square `to`.
    /// `to` does not have to be adjacent; the b-type solver moves boxes two
    /// squares per step.
    pub fn push_box(&mut self, from: usize, to: usize) {
        let box_no = self.box_no_at[from];
        assert!(box_no != NO_BOX, "No box at square {}", from);
        assert!(
            self.box_no_at[to] == NO_BOX && self.tiles[to] != Tile::Wall,
            "Cannot push box to square {}: destination blocked",
            to
        );

        self.box_no_at[from] = NO_BOX;
        self.box_no_at[to] = box_no;
        self.box_positions[box_no as usize] = to as u16;

        if self.is_goal(from) {
            self.boxes_on_goals -= 1;
        }
        if self.is_goal(to) {
            self.boxes_on_goals += 1;
        }
    }

    /// Exact inverse of `push_box(to, from)`. Calls during successor
    /// generation must form a matched push/undo pair per candidate.
    pub fn push_box_undo(&mut self, from: usize, to: usize) {
        self.push_box(from, to);
    }

    pub fn set_goal(&mut self, square: usize) {
        if self.tiles[square] != Tile::Goal {
            self.tiles[square] = Tile::Goal;
            self.goal_positions.push(square as u16);
            if self.is_box(square) {
                self.boxes_on_goals += 1;
            }
        }
    }

    pub fn remove_goal(&mut self, square: usize) {
        if self.tiles[square] == Tile::Goal {
            self.tiles[square] = Tile::Floor;
            self.goal_positions.retain(|&g| g as usize != square);
            if self.is_box(square) {
                self.boxes_on_goals -= 1;
            }
        }
    }

    /// Flood-fill the squares the player can reach from the current player
    /// position. Any box move invalidates the result.
    pub fn update_player_reachable(&mut self) {
        self.reachable.clear();

        let mut stack: ArrayVec<usize, { MAX_BOARD_SIZE * MAX_BOARD_SIZE }> = ArrayVec::new();
        stack.push(self.player_position);
        self.reachable.insert(self.player_position);

        while let Some(square) = stack.pop() {
            for direction in ALL_DIRECTIONS {
                if let Some(next) = self.offset_position(square, direction) {
                    if self.is_accessible(next) && !self.reachable.contains(next) {
                        self.reachable.insert(next);
                        stack.push(next);
                    }
                }
            }
        }
    }

    pub fn is_player_reachable(&self, square: usize) -> bool {
        self.reachable.contains(square)
    }

    /// Shortest walk from the player position to `target` over free squares.
    /// Returns `None` when `target` is unreachable.
    pub fn player_path_to(&self, target: usize) -> Option<Vec<Direction>> {
        if self.player_position == target {
            return Some(Vec::new());
        }

        let mut came_from: Vec<Option<(usize, Direction)>> = vec![None; self.size()];
        let mut visited = SquareSet::new(self.size());
        let mut queue = VecDeque::new();

        visited.insert(self.player_position);
        queue.push_back(self.player_position);

        while let Some(square) = queue.pop_front() {
            for direction in ALL_DIRECTIONS {
                let Some(next) = self.offset_position(square, direction) else {
                    continue;
                };
                if !self.is_accessible(next) || visited.contains(next) {
                    continue;
                }
                visited.insert(next);
                came_from[next] = Some((square, direction));
                if next == target {
                    let mut path = Vec::new();
                    let mut at = target;
                    while let Some((prev, dir)) = came_from[at] {
                        path.push(dir);
                        at = prev;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(next);
            }
        }

        None
    }
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        // Reachability marks are a derived cache and not part of the board
        // configuration.
        self.width == other.width
            && self.height == other.height
            && self.tiles == other.tiles
            && self.box_no_at == other.box_no_at
            && self.player_position == other.player_position
    }
}

impl Eq for Board {}

impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in 0..self.height {
            let mut line = String::new();
            for x in 0..self.width {
                let square = y * self.width + x;
                let ch = if square == self.player_position {
                    match self.get_tile(square) {
                        Tile::Goal => '+',
                        _ => '@',
                    }
                } else if self.is_box(square) {
                    match self.get_tile(square) {
                        Tile::Goal => '*',
                        _ => '$',
                    }
                } else {
                    match self.get_tile(square) {
                        Tile::Wall => '#',
                        Tile::Floor => ' ',
                        Tile::Goal => '.',
                    }
                };
                line.push(ch);
            }
            // Trim trailing spaces to match original input format
            writeln!(f, "{}", line.trim_end())?;
        }
        Ok(())
    }
}
