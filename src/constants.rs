pub const PELLET_POINTS: u32 = 10;

pub const DEFAULT_GHOST_TICK_MS: u64 = 250;

pub const DEATH_ANIMATION_FRAMES: usize = 11;

pub const DEFAULT_MAP: &str = concat!(
    "#####################\n",
    "#.........#.........#\n",
    "#.###.###.#.###.###.#\n",
    "#...................#\n",
    "#.###.#.#####.#.###.#\n",
    "#.....#...#...#.....#\n",
    "#####.### # ###.#####\n",
    "    #.#   G   #.#    \n",
    "#####.# ## ## #.#####\n",
    "     .  #GGG#  .     \n",
    "#####.# ##### #.#####\n",
    "    #.#       #.#    \n",
    "#####.# ##### #.#####\n",
    "#.........#.........#\n",
    "#.###.###.#.###.###.#\n",
    "#...#.....P.....#...#\n",
    "###.#.#.#####.#.#.###\n",
    "#.....#...#...#.....#\n",
    "#.#######.#.#######.#\n",
    "#...................#\n",
    "#####################\n",
);
