/// Character grid the visualizers draw into. Origin is top-left.
#[derive(Clone, Debug)]
pub struct Canvas {
    width: usize,
    height: usize,
    cells: Vec<char>,
}

impl Canvas {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            cells: vec![' '; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn clear(&mut self) {
        self.cells.fill(' ');
    }

    /// Out-of-bounds writes are dropped.
    pub fn plot(&mut self, x: usize, y: usize, c: char) {
        if x < self.width && y < self.height {
            self.cells[y * self.width + x] = c;
        }
    }

    pub fn get(&self, x: usize, y: usize) -> Option<char> {
        (x < self.width && y < self.height).then(|| self.cells[y * self.width + x])
    }

    pub fn hline(&mut self, x: usize, y: usize, len: usize, c: char) {
        for dx in 0..len {
            self.plot(x + dx, y, c);
        }
    }

    /// Column of `len` cells growing upwards from the bottom row.
    pub fn column_from_bottom(&mut self, x: usize, len: usize, c: char) {
        for dy in 0..len.min(self.height) {
            self.plot(x, self.height - 1 - dy, c);
        }
    }

    pub fn text(&mut self, x: usize, y: usize, text: &str) {
        for (i, c) in text.chars().enumerate() {
            self.plot(x + i, y, c);
        }
    }

    pub fn text_centered(&mut self, y: usize, text: &str) {
        let len = text.chars().count();
        let x = self.width.saturating_sub(len) / 2;
        self.text(x, y, text);
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.height);
        for row in self.cells.chunks(self.width.max(1)) {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }
}
