//! 手書き署名パッド（ポインタ入力 → ラスタ → data URI）。

use base64::{
    Engine as _,
    engine::general_purpose::{STANDARD, URL_SAFE_NO_PAD},
};
use ratatui::{buffer::Buffer, layout::Rect, widgets::Widget};
use sha2::{Digest, Sha256};

/// 署名面の高さ（論理単位）。
pub const SIGNATURE_HEIGHT: u16 = 150;

/// data URIの接頭辞（バイナリPBM）。
const DATA_URI_PREFIX: &str = "data:image/x-portable-bitmap;base64,";

/// ペンの太さ（論理単位）。
const PEN_WIDTH: i32 = 2;

/// 署名面上の座標（論理単位）。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Point {
    pub x: u16,
    pub y: u16,
}

impl Point {
    pub fn new(x: u16, y: u16) -> Self {
        Self { x, y }
    }
}

/// 署名パッドの状態。保持するのはラスタと描画中かどうかだけ。
#[derive(Clone, Debug)]
pub struct SignaturePad {
    /// 横幅（論理単位）。
    width: u16,
    /// 高さ（論理単位）。
    height: u16,
    /// 1ピクセル1要素のラスタ（trueがインク）。
    pixels: Vec<bool>,
    /// 描画中ストロークの直前の点。Noneならペンは上がっている。
    pen: Option<Point>,
    /// 一度でも線が引かれたか。
    has_content: bool,
}

impl SignaturePad {
    /// 指定幅・固定高さの空のパッドを作る。
    pub fn new(width: u16) -> Self {
        let width = width.max(1);
        Self {
            width,
            height: SIGNATURE_HEIGHT,
            pixels: vec![false; width as usize * SIGNATURE_HEIGHT as usize],
            pen: None,
            has_content: false,
        }
    }

    /// 線が引かれているか。
    pub fn has_content(&self) -> bool {
        self.has_content
    }

    /// ストローク中か。
    pub fn is_drawing(&self) -> bool {
        self.pen.is_some()
    }

    fn contains(&self, p: Point) -> bool {
        p.x < self.width && p.y < self.height
    }

    /// ポインタ押下：面の内側ならその点からストロークを始める。
    pub fn pointer_down(&mut self, p: Point) {
        if self.contains(p) {
            self.pen = Some(p);
        }
    }

    /// ポインタ移動：ストローク中なら線を延ばし、更新後の画像を報告する。
    ///
    /// 移動1回につき報告は1回。ストローク外の移動は何も描かない。
    pub fn pointer_move(&mut self, p: Point) -> Option<String> {
        let from = self.pen?;
        // 面の外へ出たらストロークを終える。
        if !self.contains(p) {
            self.pen = None;
            return None;
        }
        self.draw_line(from, p);
        self.pen = Some(p);
        self.has_content = true;
        Some(self.to_data_uri())
    }

    /// ポインタ解放：ストロークを終える。
    pub fn pointer_up(&mut self) {
        self.pen = None;
    }

    /// ポインタが面から外れた：ストロークを終える。
    pub fn pointer_leave(&mut self) {
        self.pen = None;
    }

    /// 全消去。空文字を報告値として返す。
    pub fn clear(&mut self) -> String {
        self.pixels.fill(false);
        self.pen = None;
        self.has_content = false;
        String::new()
    }

    /// 指定ピクセルにインクがあるか。
    pub fn is_inked(&self, x: u16, y: u16) -> bool {
        x < self.width && y < self.height && self.pixels[self.index(x, y)]
    }

    fn index(&self, x: u16, y: u16) -> usize {
        y as usize * self.width as usize + x as usize
    }

    /// ペン幅ぶんの正方形を打つ（面の外は切り捨て）。
    fn stamp(&mut self, x: i32, y: i32) {
        for dy in 0..PEN_WIDTH {
            for dx in 0..PEN_WIDTH {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 && px < self.width as i32 && py < self.height as i32 {
                    let idx = self.index(px as u16, py as u16);
                    self.pixels[idx] = true;
                }
            }
        }
    }

    /// Bresenhamで2点間を結ぶ。
    fn draw_line(&mut self, from: Point, to: Point) {
        let (mut x0, mut y0) = (from.x as i32, from.y as i32);
        let (x1, y1) = (to.x as i32, to.y as i32);
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let mut err = dx + dy;
        loop {
            self.stamp(x0, y0);
            if x0 == x1 && y0 == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x0 += sx;
            }
            if e2 <= dx {
                err += dx;
                y0 += sy;
            }
        }
    }

    /// ラスタをバイナリPBM（P4）に直列化する。
    pub fn to_pbm(&self) -> Vec<u8> {
        let mut out = format!("P4\n{} {}\n", self.width, self.height).into_bytes();
        let row_bytes = (self.width as usize).div_ceil(8);
        for y in 0..self.height {
            let mut row = vec![0u8; row_bytes];
            for x in 0..self.width {
                if self.pixels[self.index(x, y)] {
                    row[x as usize / 8] |= 0x80 >> (x % 8);
                }
            }
            out.extend_from_slice(&row);
        }
        out
    }

    /// 現在のラスタをdata URIへ変換する。
    pub fn to_data_uri(&self) -> String {
        format!("{}{}", DATA_URI_PREFIX, STANDARD.encode(self.to_pbm()))
    }

    /// 端末セル座標を論理座標へ変換する（領域外はNone）。
    pub fn point_from_cell(&self, area: Rect, col: u16, row: u16) -> Option<Point> {
        if area.width == 0
            || area.height == 0
            || col < area.x
            || row < area.y
            || col >= area.x + area.width
            || row >= area.y + area.height
        {
            return None;
        }
        // セル中心を論理座標へ比例配分する。
        let x = ((col - area.x) as u32 * 2 + 1) * self.width as u32 / (area.width as u32 * 2);
        let y = ((row - area.y) as u32 * 2 + 1) * self.height as u32 / (area.height as u32 * 2);
        Some(Point::new(x as u16, y as u16))
    }

    /// 論理範囲 [x0,x1)×[y0,y1) にインクがあるか。
    fn any_ink(&self, x0: u32, x1: u32, y0: u32, y1: u32) -> bool {
        let x1 = x1.max(x0 + 1).min(self.width as u32);
        let y1 = y1.max(y0 + 1).min(self.height as u32);
        (y0..y1).any(|y| (x0..x1).any(|x| self.is_inked(x as u16, y as u16)))
    }
}

/// 署名画像の短い指紋（SHA-256をURLセーフbase64にした先頭16文字）。
pub fn fingerprint(data_uri: &str) -> String {
    if data_uri.is_empty() {
        return String::new();
    }
    let hash = Sha256::digest(data_uri.as_bytes());
    URL_SAFE_NO_PAD.encode(hash).chars().take(16).collect()
}

/// 半角ブロックでラスタを縮小表示する。
impl Widget for &SignaturePad {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.width == 0 || area.height == 0 {
            return;
        }
        let (w, h) = (self.width as u32, self.height as u32);
        let (aw, ah) = (area.width as u32, area.height as u32 * 2);
        for cy in 0..area.height {
            for cx in 0..area.width {
                let x0 = cx as u32 * w / aw;
                let x1 = (cx as u32 + 1) * w / aw;
                // 1セルを上下2つの半ブロックに分ける。
                let top = cy as u32 * 2;
                let upper = self.any_ink(x0, x1, top * h / ah, (top + 1) * h / ah);
                let lower = self.any_ink(x0, x1, (top + 1) * h / ah, (top + 2) * h / ah);
                let symbol = match (upper, lower) {
                    (true, true) => "█",
                    (true, false) => "▀",
                    (false, true) => "▄",
                    (false, false) => " ",
                };
                if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                    cell.set_symbol(symbol);
                }
            }
        }
    }
}
