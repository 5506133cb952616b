use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use image::ImageReader;
use pixels::{Pixels, SurfaceTexture};
use thiserror::Error;
use tracing::warn;
use winit::window::Window;

use crate::asset_keys::validate_asset_key;
use crate::catalog::{TileCatalog, TileKind, TileLayer, EMPTY_TILE};
use crate::grid::{Grid, Vec2};
use crate::interaction::{HoverPreview, Surface};
use crate::session::Session;

use super::Viewport;

/// Kind drawn over the hovered palette cell when the catalog provides it.
pub const HIGHLIGHT_TILE: &str = "highlight_0";

const CLEAR_COLOR: [u8; 4] = [230, 230, 230, 255];
const OUTLINE_COLOR: [u8; 4] = [255, 255, 255, 255];
const CENTER_LINE_COLOR: [u8; 4] = [0, 0, 0, 255];
const CENTER_LINE_WIDTH_PX: i32 = 4;
const HOVER_HIGHLIGHT_COLOR: [u8; 4] = [255, 210, 70, 255];
const GHOST_ALPHA: u8 = 128;
const TILE_FALLBACK_COLORS: [[u8; 4]; 6] = [
    [112, 83, 58, 255],
    [74, 112, 56, 255],
    [96, 96, 104, 255],
    [150, 120, 70, 255],
    [60, 90, 140, 255],
    [140, 70, 60, 255],
];

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to create pixel surface: {0}")]
    Create(#[source] pixels::Error),
    #[error("failed to resize pixel surface: {0}")]
    Resize(#[source] pixels::TextureError),
    #[error("failed to present frame: {0}")]
    Present(#[source] pixels::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PixelRectI {
    left: i32,
    top: i32,
    right: i32,
    bottom: i32,
}

impl PixelRectI {
    fn width(&self) -> i32 {
        self.right - self.left
    }

    fn height(&self) -> i32 {
        self.bottom - self.top
    }
}

struct LoadedSprite {
    width: u32,
    height: u32,
    rgba: Vec<u8>,
}

/// Sprites keyed by asset key. Failed loads are cached as `None` and warned about once.
struct SpriteCache {
    sprite_dir: PathBuf,
    sprites: HashMap<String, Option<LoadedSprite>>,
    warned_keys: HashSet<String>,
}

impl SpriteCache {
    fn new(sprite_dir: PathBuf) -> Self {
        Self {
            sprite_dir,
            sprites: HashMap::new(),
            warned_keys: HashSet::new(),
        }
    }

    fn resolve(&mut self, key: &str) -> Option<&LoadedSprite> {
        if !self.sprites.contains_key(key) {
            let loaded = match resolve_sprite_image_path(&self.sprite_dir, key)
                .and_then(|path| load_sprite_rgba(&path).map_err(|reason| (Some(path), reason)))
            {
                Ok(sprite) => Some(sprite),
                Err((path, reason)) => {
                    self.warn_once(key, path.as_deref(), &reason);
                    None
                }
            };
            self.sprites.insert(key.to_string(), loaded);
        }
        self.sprites.get(key).and_then(Option::as_ref)
    }

    fn warn_once(&mut self, key: &str, resolved_path: Option<&Path>, reason: &str) {
        if !self.warned_keys.insert(key.to_string()) {
            return;
        }
        let path_display = resolved_path
            .map(|path| path.display().to_string())
            .unwrap_or_else(|| "<unresolved>".to_string());
        warn!(
            asset_key = key,
            path = %path_display,
            reason,
            "renderer_sprite_load_failed_using_fallback"
        );
    }
}

pub struct Renderer {
    pixels: Pixels<'static>,
    canvas: Viewport,
    sprites: SpriteCache,
}

impl Renderer {
    pub fn new(
        window: Arc<Window>,
        canvas: Viewport,
        sprite_dir: PathBuf,
    ) -> Result<Self, RenderError> {
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, window);
        let pixels =
            Pixels::new(canvas.width, canvas.height, surface).map_err(RenderError::Create)?;
        Ok(Self {
            pixels,
            canvas,
            sprites: SpriteCache::new(sprite_dir),
        })
    }

    pub fn resize(&mut self, width: u32, height: u32) -> Result<(), RenderError> {
        if width == 0 || height == 0 {
            return Ok(());
        }
        self.pixels
            .resize_surface(width, height)
            .map_err(RenderError::Resize)
    }

    /// Maps a physical window position to canvas pixels. `None` outside the canvas.
    pub fn window_to_canvas(&self, x: f32, y: f32) -> Option<Vec2> {
        self.pixels
            .window_pos_to_pixel((x, y))
            .ok()
            .map(|(px, py)| Vec2::new(px as f32, py as f32))
    }

    pub fn render_session(
        &mut self,
        session: &Session,
        cursor: Option<Vec2>,
    ) -> Result<(), RenderError> {
        let canvas = self.canvas;
        draw_session(
            self.pixels.frame_mut(),
            canvas,
            session,
            cursor,
            &mut self.sprites,
        );
        self.pixels.render().map_err(RenderError::Present)
    }
}

fn draw_session(
    frame: &mut [u8],
    canvas: Viewport,
    session: &Session,
    cursor: Option<Vec2>,
    sprites: &mut SpriteCache,
) {
    if canvas.width == 0 || canvas.height == 0 {
        return;
    }
    for chunk in frame.chunks_exact_mut(4) {
        chunk.copy_from_slice(&CLEAR_COLOR);
    }

    let catalog = session.catalog();
    draw_surface_tiles(frame, canvas, session.game(), catalog, sprites);
    draw_surface_tiles(frame, canvas, session.palette(), catalog, sprites);

    for surface in [session.game(), session.palette()] {
        let display = surface.grid.display();
        if display.outlines_visible {
            draw_grid_outlines(frame, canvas, &surface.grid);
        }
        if display.center_line_visible {
            draw_center_line(frame, canvas, &surface.grid);
        }
    }

    let Some(cursor) = cursor else {
        return;
    };
    match session.hover_preview(cursor) {
        HoverPreview::Ghost { cell, kind } => {
            let rect = cell_rect(&session.game().grid, cell.row, cell.col);
            if kind != EMPTY_TILE {
                if let Ok(kind) = catalog.lookup(kind) {
                    draw_tile(frame, canvas, rect, kind, sprites, GHOST_ALPHA);
                }
            } else {
                draw_rect_outline(frame, canvas, rect, HOVER_HIGHLIGHT_COLOR);
            }
        }
        HoverPreview::PaletteHighlight { cell } => {
            let rect = cell_rect(&session.palette().grid, cell.row, cell.col);
            match catalog.lookup(HIGHLIGHT_TILE) {
                Ok(kind) => draw_tile(frame, canvas, rect, kind, sprites, u8::MAX),
                Err(_) => draw_rect_outline(frame, canvas, rect, HOVER_HIGHLIGHT_COLOR),
            }
        }
        HoverPreview::None => {}
    }
}

fn draw_surface_tiles(
    frame: &mut [u8],
    canvas: Viewport,
    surface: &Surface,
    catalog: &TileCatalog,
    sprites: &mut SpriteCache,
) {
    for (row, col, name) in surface.board.iter_cells() {
        if name == EMPTY_TILE {
            continue;
        }
        let Ok(kind) = catalog.lookup(name) else {
            continue;
        };
        let rect = cell_rect(&surface.grid, row, col);
        draw_tile(frame, canvas, rect, kind, sprites, u8::MAX);
    }
}

fn draw_tile(
    frame: &mut [u8],
    canvas: Viewport,
    rect: PixelRectI,
    kind: &TileKind,
    sprites: &mut SpriteCache,
    alpha: u8,
) {
    if let Some(sprite) = sprites.resolve(&kind.asset_key) {
        draw_sprite_scaled(frame, canvas, rect, sprite, alpha);
        return;
    }
    match kind.layer {
        TileLayer::Build => fill_rect(frame, canvas, rect, tile_fallback_color(kind), alpha),
        TileLayer::Ui => draw_rect_outline(frame, canvas, rect, HOVER_HIGHLIGHT_COLOR),
    }
}

fn tile_fallback_color(kind: &TileKind) -> [u8; 4] {
    TILE_FALLBACK_COLORS[kind.id.0 as usize % TILE_FALLBACK_COLORS.len()]
}

/// Integer pixel rect of a cell; neighbouring cells share edges exactly.
fn cell_rect(grid: &Grid, row: u32, col: u32) -> PixelRectI {
    let (row, col) = (i64::from(row), i64::from(col));
    let top_left = grid.cell_origin(row, col);
    let bottom_right = grid.cell_origin(row + 1, col + 1);
    PixelRectI {
        left: top_left.x.round() as i32,
        top: top_left.y.round() as i32,
        right: bottom_right.x.round() as i32,
        bottom: bottom_right.y.round() as i32,
    }
}

fn draw_grid_outlines(frame: &mut [u8], canvas: Viewport, grid: &Grid) {
    for row in 0..grid.rows() {
        for col in 0..grid.cols() {
            draw_rect_outline(frame, canvas, cell_rect(grid, row, col), OUTLINE_COLOR);
        }
    }
}

fn draw_center_line(frame: &mut [u8], canvas: Viewport, grid: &Grid) {
    let Some(col) = grid.center_line_column() else {
        return;
    };
    let top = cell_rect(grid, 0, col);
    let bottom = cell_rect(grid, grid.rows() - 1, col);
    let half = CENTER_LINE_WIDTH_PX / 2;
    let line = PixelRectI {
        left: top.left - half,
        top: top.top,
        right: top.left - half + CENTER_LINE_WIDTH_PX,
        bottom: bottom.bottom,
    };
    fill_rect(frame, canvas, line, CENTER_LINE_COLOR, u8::MAX);
}

fn fill_rect(frame: &mut [u8], canvas: Viewport, rect: PixelRectI, color: [u8; 4], alpha: u8) {
    for y in rect.top..rect.bottom {
        for x in rect.left..rect.right {
            blend_pixel_clipped(frame, canvas, x, y, color, alpha);
        }
    }
}

fn draw_rect_outline(frame: &mut [u8], canvas: Viewport, rect: PixelRectI, color: [u8; 4]) {
    if rect.width() <= 0 || rect.height() <= 0 {
        return;
    }
    let (right, bottom) = (rect.right - 1, rect.bottom - 1);
    for x in rect.left..=right {
        blend_pixel_clipped(frame, canvas, x, rect.top, color, u8::MAX);
        blend_pixel_clipped(frame, canvas, x, bottom, color, u8::MAX);
    }
    for y in rect.top..=bottom {
        blend_pixel_clipped(frame, canvas, rect.left, y, color, u8::MAX);
        blend_pixel_clipped(frame, canvas, right, y, color, u8::MAX);
    }
}

/// Nearest-neighbour blit of a sprite stretched to `rect`. Transparent texels are skipped.
fn draw_sprite_scaled(
    frame: &mut [u8],
    canvas: Viewport,
    rect: PixelRectI,
    sprite: &LoadedSprite,
    alpha: u8,
) {
    if sprite.width == 0 || sprite.height == 0 || rect.width() <= 0 || rect.height() <= 0 {
        return;
    }
    let expected_rgba_len = sprite.width as usize * sprite.height as usize * 4;
    if sprite.rgba.len() < expected_rgba_len {
        return;
    }

    let sprite_width = sprite.width as usize;
    for out_y in rect.top.max(0)..rect.bottom.min(canvas.height as i32) {
        let dy = (out_y - rect.top) as u64;
        let src_y = (dy * u64::from(sprite.height) / rect.height() as u64) as usize;
        let src_y = src_y.min(sprite.height as usize - 1);
        for out_x in rect.left.max(0)..rect.right.min(canvas.width as i32) {
            let dx = (out_x - rect.left) as u64;
            let src_x = (dx * u64::from(sprite.width) / rect.width() as u64) as usize;
            let src_x = src_x.min(sprite_width - 1);
            let src_offset = (src_y * sprite_width + src_x) * 4;
            let texel = [
                sprite.rgba[src_offset],
                sprite.rgba[src_offset + 1],
                sprite.rgba[src_offset + 2],
                sprite.rgba[src_offset + 3],
            ];
            if texel[3] == 0 {
                continue;
            }
            let combined = (u16::from(texel[3]) * u16::from(alpha) / 255) as u8;
            blend_pixel_clipped(frame, canvas, out_x, out_y, texel, combined);
        }
    }
}

fn blend_pixel_clipped(
    frame: &mut [u8],
    canvas: Viewport,
    x: i32,
    y: i32,
    color: [u8; 4],
    alpha: u8,
) {
    if x < 0 || y < 0 || x >= canvas.width as i32 || y >= canvas.height as i32 {
        return;
    }
    let offset = (y as usize * canvas.width as usize + x as usize) * 4;
    let Some(dst) = frame.get_mut(offset..offset + 4) else {
        return;
    };
    if alpha == u8::MAX {
        dst.copy_from_slice(&[color[0], color[1], color[2], 255]);
        return;
    }
    let a = u16::from(alpha);
    for channel in 0..3 {
        let src = u16::from(color[channel]);
        let old = u16::from(dst[channel]);
        dst[channel] = ((src * a + old * (255 - a)) / 255) as u8;
    }
    dst[3] = 255;
}

fn resolve_sprite_image_path(
    sprite_dir: &Path,
    key: &str,
) -> Result<PathBuf, (Option<PathBuf>, String)> {
    validate_asset_key(key).map_err(|error| (None, format!("invalid_key:{error}")))?;
    Ok(sprite_dir.join(format!("{key}.png")))
}

fn load_sprite_rgba(path: &Path) -> Result<LoadedSprite, String> {
    let reader = ImageReader::open(path).map_err(|error| format!("file_open_failed:{error}"))?;
    let decoded = reader
        .decode()
        .map_err(|error| format!("decode_failed:{error}"))?;
    let image = decoded.to_rgba8();
    Ok(LoadedSprite {
        width: image.width(),
        height: image.height(),
        rgba: image.into_raw(),
    })
}
