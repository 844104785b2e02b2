use super::constants::{
    GRAVITY, JUMP_VELOCITY, MAX_FALL_SPEED, MAX_SUBSTEP, MOVE_SPEED, TILE_SIZE,
};
use super::tile_map::{tile_to_world, world_to_tile, TileMap};
use super::types::{Action, Player};

/// Advances one player by a single tick against the level.
///
/// Long ticks are split into equal slices of at most `MAX_SUBSTEP` frames so
/// a fast fall cannot skip over a one-tile platform.
pub fn step_player(player: &mut Player, map: &TileMap, dt: f32) {
    let dt = dt.max(0.0);
    let steps = (dt / MAX_SUBSTEP).ceil().max(1.0) as u32;
    let slice = dt / steps as f32;
    for _ in 0..steps {
        substep(player, map, slice);
    }
}

/// Order matters: queued actions, gravity, map-bottom grounding, vertical
/// tile collision, horizontal tile collision, then the re-grounding check.
/// Running horizontal before vertical changes how tile corners resolve.
fn substep(player: &mut Player, map: &TileMap, dt: f32) {
    apply_actions(player, map, dt);

    if !player.is_grounded {
        player.dy = (player.dy + GRAVITY * dt).clamp(-MAX_FALL_SPEED, MAX_FALL_SPEED);
        player.y += player.dy * dt;
    }

    let ground_level = map.ground_level();
    if player.y >= ground_level {
        player.is_grounded = true;
        player.y = ground_level;
        if player.dy > 0.0 {
            player.dy = 0.0;
        }
    }

    resolve_tiles(player, map, ground_level);
}

fn apply_actions(player: &mut Player, map: &TileMap, dt: f32) {
    player.dx = 0.0;
    let queued = player.actions().to_vec();
    for action in queued {
        match action {
            Action::Up => {
                if player.is_dead() || !player.is_grounded {
                    continue;
                }
                player.is_grounded = false;
                player.dy = JUMP_VELOCITY;
            }
            Action::Left => {
                if player.is_dead() {
                    continue;
                }
                player.dx -= MOVE_SPEED;
                player.x = (player.x - MOVE_SPEED * dt).clamp(0.0, map.max_x());
            }
            Action::Right => {
                if player.is_dead() {
                    continue;
                }
                player.dx += MOVE_SPEED;
                player.x = (player.x + MOVE_SPEED * dt).clamp(0.0, map.max_x());
            }
            Action::Down => {}
        }
    }
}

fn resolve_tiles(player: &mut Player, map: &TileMap, ground_level: f32) {
    let tx = world_to_tile(player.x);
    let ty = world_to_tile(player.y);
    let mut overlap_x = player.x.rem_euclid(TILE_SIZE) > 0.0;
    let mut overlap_y = player.y.rem_euclid(TILE_SIZE) > 0.0;

    let mut cell = map.is_solid(tx, ty);
    let mut cell_right = map.is_solid(tx + 1, ty);
    let cell_down = map.is_solid(tx, ty + 1);
    let cell_diag = map.is_solid(tx + 1, ty + 1);

    if player.dy > 0.0 {
        if (cell_down && !cell) || (cell_diag && !cell_right && overlap_x) {
            player.y = tile_to_world(ty);
            player.dy = 0.0;
            player.is_grounded = true;
            overlap_y = false;
        }
    } else if player.dy < 0.0 {
        if (cell && !cell_down) || (cell_right && !cell_diag && overlap_x) {
            player.y = tile_to_world(ty + 1);
            player.dy = 0.0;
            cell = cell_down;
            cell_right = cell_diag;
            overlap_y = false;
        }
    }

    if player.dx > 0.0 {
        if (cell_right && !cell) || (cell_diag && !cell_down && overlap_y) {
            player.x = tile_to_world(tx);
            overlap_x = false;
        }
    } else if player.dx < 0.0 {
        if (cell && !cell_right) || (cell_down && !cell_diag && overlap_y) {
            player.x = tile_to_world(tx + 1);
            overlap_x = false;
        }
    }

    // Resting on the map bottom keeps the player grounded with no tile below.
    if player.is_grounded
        && player.y < ground_level
        && !(cell_down || (cell_diag && overlap_x))
    {
        player.is_grounded = false;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Crushed {
    First,
    Second,
}

/// Tile-sized boxes anchored at each player's top-left corner.
pub fn players_overlap(a: &Player, b: &Player) -> bool {
    (a.x - b.x).abs() < TILE_SIZE && (a.y - b.y).abs() < TILE_SIZE
}

/// The player with the larger `y` is underneath and gets crushed. Only a
/// living player crushes, and a player already dead is never crushed again.
pub fn crush_between(a: &Player, b: &Player) -> Option<Crushed> {
    if !players_overlap(a, b) || a.y == b.y {
        return None;
    }
    let (upper, lower, crushed) = if a.y < b.y {
        (a, b, Crushed::Second)
    } else {
        (b, a, Crushed::First)
    };
    if upper.is_dead() || lower.is_dead() {
        return None;
    }
    Some(crushed)
}

#[cfg(test)]
mod tests {
    use super::*;

    const W: usize = 8;
    const H: usize = 6;

    /// Open 8x6 map with a solid floor on row 4 and a single block at (5, 2).
    fn level() -> TileMap {
        let mut cells = vec![0u8; W * H];
        for x in 0..W {
            cells[x + 4 * W] = 1;
        }
        cells[5 + 2 * W] = 1;
        TileMap::new(W, H, cells).expect("level")
    }

    fn empty_level() -> TileMap {
        TileMap::new(W, H, vec![0; W * H]).expect("level")
    }

    fn player_at(x: f32, y: f32) -> Player {
        Player::new(x, y)
    }

    #[test]
    fn falling_player_lands_on_tile_boundary() {
        let map = level();
        let mut player = player_at(20.0, 55.0);
        player.dy = 6.0;

        step_player(&mut player, &map, 1.0);

        assert_eq!(player.dy, 0.0);
        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
    }

    #[test]
    fn landing_diagonally_when_overlapping_horizontally() {
        let mut cells = vec![0u8; W * H];
        cells[2 + 4 * W] = 1;
        let map = TileMap::new(W, H, cells).expect("level");
        // Straddles tiles 1 and 2; only the diagonal tile below is solid.
        let mut player = player_at(30.0, 58.0);
        player.dy = 3.0;

        step_player(&mut player, &map, 1.0);

        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
        assert_eq!(player.dy, 0.0);
    }

    #[test]
    fn long_tick_fall_lands_on_platform() {
        let map = level();
        let mut player = player_at(20.0, 59.0);
        player.dy = MAX_FALL_SPEED;

        step_player(&mut player, &map, 1.5);
        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
        assert_eq!(player.dy, 0.0);

        for _ in 0..3 {
            step_player(&mut player, &map, 1.5);
        }
        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
    }

    #[test]
    fn max_dt_fall_from_the_top_never_enters_the_floor() {
        let map = level();
        let mut player = player_at(20.0, 0.0);
        player.dy = MAX_FALL_SPEED;

        step_player(&mut player, &map, 5.0);

        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
        assert!(!map.is_solid(world_to_tile(player.x), world_to_tile(player.y)));
    }

    #[test]
    fn grounded_player_stays_put() {
        let map = level();
        let mut player = player_at(20.0, 60.0);
        player.is_grounded = true;

        step_player(&mut player, &map, 1.0);

        assert!(player.is_grounded);
        assert_eq!(player.y, 60.0);
        assert_eq!(player.dy, 0.0);
    }

    #[test]
    fn jump_requires_ground_and_life() {
        let map = level();
        let mut player = player_at(20.0, 60.0);
        player.is_grounded = true;
        player.add_action(Action::Up);

        step_player(&mut player, &map, 1.0);
        assert!(!player.is_grounded);
        assert_eq!(player.dy, JUMP_VELOCITY + GRAVITY);
        assert!(player.y < 60.0);

        let mut airborne = player_at(20.0, 20.0);
        airborne.add_action(Action::Up);
        step_player(&mut airborne, &empty_level(), 1.0);
        assert_eq!(airborne.dy, GRAVITY);

        let mut dead = player_at(20.0, 60.0);
        dead.is_grounded = true;
        dead.die();
        dead.add_action(Action::Up);
        step_player(&mut dead, &map, 1.0);
        assert!(dead.is_grounded);
        assert_eq!(dead.y, 60.0);
    }

    #[test]
    fn dead_player_ignores_actions_but_still_falls() {
        let map = empty_level();
        let mut player = player_at(40.0, 0.0);
        player.die();
        player.add_action(Action::Right);

        step_player(&mut player, &map, 1.0);

        assert_eq!(player.x, 40.0);
        assert!(player.y > 0.0);
    }

    #[test]
    fn horizontal_movement_clamps_to_map_edges() {
        let map = empty_level();
        let mut player = player_at(1.0, 100.0);
        player.is_grounded = true;
        player.add_action(Action::Left);
        step_player(&mut player, &map, 1.0);
        assert_eq!(player.x, 0.0);

        let max_x = ((W - 1) as f32) * TILE_SIZE;
        let mut player = player_at(max_x - 1.0, 100.0);
        player.is_grounded = true;
        player.add_action(Action::Right);
        step_player(&mut player, &map, 1.0);
        assert_eq!(player.x, max_x);
    }

    #[test]
    fn walking_right_into_block_snaps_to_its_left_edge() {
        let map = level();
        // Standing in row 2 next to the block at column 5.
        let mut player = player_at(79.0, 40.0);
        player.is_grounded = true;
        player.add_action(Action::Right);

        step_player(&mut player, &map, 1.0);

        assert_eq!(player.x, 80.0);
        assert_eq!(player.dx, MOVE_SPEED);
    }

    #[test]
    fn walking_left_into_block_snaps_to_its_right_edge() {
        let map = level();
        let mut player = player_at(121.0, 40.0);
        player.is_grounded = true;
        player.add_action(Action::Left);

        step_player(&mut player, &map, 1.0);

        assert_eq!(player.x, 120.0);
    }

    #[test]
    fn rising_into_block_snaps_below_it() {
        let map = level();
        let mut player = player_at(100.0, 62.0);
        player.dy = -10.0;

        step_player(&mut player, &map, 1.0);

        assert_eq!(player.y, 60.0);
        assert_eq!(player.dy, 0.0);
    }

    #[test]
    fn walking_off_a_ledge_clears_grounded() {
        let mut cells = vec![0u8; W * H];
        cells[4 * W] = 1;
        let map = TileMap::new(W, H, cells).expect("level");
        let mut player = player_at(19.0, 60.0);
        player.is_grounded = true;
        player.add_action(Action::Right);

        step_player(&mut player, &map, 1.0);

        assert!(!player.is_grounded);
    }

    #[test]
    fn map_bottom_grounds_without_floor_tiles() {
        let map = empty_level();
        let ground = ((H - 1) as f32) * TILE_SIZE;
        let mut player = player_at(0.0, ground - 2.0);
        player.dy = 8.0;

        step_player(&mut player, &map, 1.0);
        assert!(player.is_grounded);
        assert_eq!(player.y, ground);

        step_player(&mut player, &map, 1.0);
        assert!(player.is_grounded);
        assert_eq!(player.y, ground);
    }

    #[test]
    fn off_map_columns_never_block() {
        let map = empty_level();
        let mut player = player_at(0.0, 20.0);
        player.is_grounded = true;
        player.add_action(Action::Left);
        step_player(&mut player, &map, 1.0);
        assert_eq!(player.x, 0.0);
        assert!(!player.is_grounded);
    }

    #[test]
    fn step_is_deterministic() {
        let map = level();
        let mut a = player_at(33.0, 12.5);
        a.dy = -3.25;
        a.set_actions([Action::Right, Action::Up]);
        let mut b = a.clone();
        for _ in 0..40 {
            step_player(&mut a, &map, 1.3);
            step_player(&mut b, &map, 1.3);
            assert_eq!(a, b);
        }
    }

    #[test]
    fn lower_player_is_crushed() {
        let top = player_at(40.0, 30.0);
        let bottom = player_at(45.0, 42.0);
        assert_eq!(crush_between(&top, &bottom), Some(Crushed::Second));
        assert_eq!(crush_between(&bottom, &top), Some(Crushed::First));
    }

    #[test]
    fn no_crush_without_overlap_or_at_equal_height() {
        let a = player_at(0.0, 0.0);
        let far = player_at(0.0, 20.0);
        assert_eq!(crush_between(&a, &far), None);
        let side = player_at(10.0, 0.0);
        assert_eq!(crush_between(&a, &side), None);
    }

    #[test]
    fn dead_players_neither_crush_nor_die_twice() {
        let mut top = player_at(0.0, 0.0);
        top.die();
        let bottom = player_at(0.0, 10.0);
        assert_eq!(crush_between(&top, &bottom), None);

        let top = player_at(0.0, 0.0);
        let mut bottom = player_at(0.0, 10.0);
        bottom.die();
        assert_eq!(crush_between(&top, &bottom), None);
    }
}
