use crate::sprite::Sprite;
use crate::types::{LevelSnapshot, PlayerView};

pub fn render_frame(snapshot: &LevelSnapshot) -> String {
    let mut grid: Vec<Vec<char>> = snapshot
        .tiles
        .iter()
        .map(|row| row.chars().collect())
        .collect();

    for ghost in &snapshot.ghosts {
        let sprite = Sprite::Ghost {
            color: ghost.color,
            dir: ghost.dir,
        };
        put(&mut grid, ghost.x, ghost.y, sprite.glyph());
    }
    for player in &snapshot.players {
        put(&mut grid, player.x, player.y, player_sprite(player).glyph());
    }

    let mut frame = String::new();
    for row in grid {
        frame.extend(row);
        frame.push('\n');
    }
    frame.push_str(&status_line(snapshot));
    frame.push('\n');
    frame
}

fn player_sprite(player: &PlayerView) -> Sprite {
    if player.alive {
        Sprite::PacMan { dir: player.dir }
    } else {
        Sprite::PacManDying {
            frame: player.death_frame,
        }
    }
}

fn put(grid: &mut [Vec<char>], x: i32, y: i32, glyph: char) {
    let (Ok(x), Ok(y)) = (usize::try_from(x), usize::try_from(y)) else {
        return;
    };
    if let Some(cell) = grid.get_mut(y).and_then(|row| row.get_mut(x)) {
        *cell = glyph;
    }
}

fn status_line(snapshot: &LevelSnapshot) -> String {
    let scores: Vec<String> = snapshot
        .players
        .iter()
        .map(|player| {
            let state = if player.alive { "" } else { " (dead)" };
            format!("P{}={}{}", player.id.0, player.score, state)
        })
        .collect();
    let outcome = if snapshot.completed {
        " | level completed"
    } else {
        ""
    };
    format!(
        "score {} | pellets left {}{}",
        scores.join(" "),
        snapshot.remaining_pellets,
        outcome
    )
}
