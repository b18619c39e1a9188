//! Block-type catalog of the Pi edition world (ids 0-255).

const CATALOG: &[(u8, &str)] = &[
    (0, "Air"), (1, "Stone"), (2, "Grass"), (3, "Dirt"), (4, "Cobblestone"),
    (5, "Oak Wood Plank"), (6, "Oak Sapling"), (7, "Bedrock"), (8, "Flowing Water"),
    (9, "Still Water"), (10, "Flowing Lava"), (11, "Still Lava"), (12, "Sand"),
    (13, "Gravel"), (14, "Gold Ore"), (15, "Iron Ore"), (16, "Coal Ore"), (17, "Oak Wood"),
    (19, "Sponge"), (20, "Glass"), (21, "Lapis Lazuli Ore"), (22, "Lapis Lazuli Block"),
    (23, "Dispenser"), (24, "Sandstone"), (25, "Note Block"), (26, "Bed"),
    (27, "Powered Rail"), (28, "Detector Rail"), (29, "Sticky Piston"), (30, "Cobweb"),
    (31, "Dead Shrub"), (32, "Dead Bush"), (33, "Piston"), (34, "Piston Head"),
    (35, "White Wool"), (37, "Dandelion"), (38, "Poppy"), (39, "Brown Mushroom"),
    (40, "Red Mushroom"), (41, "Gold Block"), (42, "Iron Block"), (43, "Double Stone Slab"),
    (44, "Stone Slab"), (45, "Bricks"), (46, "TNT"), (47, "Bookshelf"), (48, "Moss Stone"),
    (49, "Obsidian"), (50, "Torch"), (51, "Fire"), (52, "Monster Spawner"),
    (53, "Oak Wood Stairs"), (54, "Chest"), (55, "Redstone Wire"), (56, "Diamond Ore"),
    (57, "Diamond Block"), (58, "Crafting Table"), (59, "Wheat Crops"), (60, "Farmland"),
    (61, "Furnace"), (62, "Burning Furnace"), (63, "Standing Sign Block"),
    (64, "Oak Door Block"), (65, "Ladder"), (66, "Rail"), (67, "Cobblestone Stairs"),
    (68, "Wallmounted Sign Block"), (69, "Lever"), (70, "Stone Pressure Plate"),
    (71, "Iron Door Block"), (72, "Wooden Pressure Plate"), (73, "Redstone Ore"),
    (74, "Glowing Redstone Ore"), (75, "Redstone Torch Off"), (76, "Redstone Torch On"),
    (77, "Stone Button"), (78, "Snow"), (79, "Ice"), (80, "Snow Block"), (81, "Cactus"),
    (82, "Clay"), (83, "Sugar Canes"), (84, "Jukebox"), (85, "Oak Fence"), (86, "Pumpkin"),
    (87, "Netherrack"), (88, "Soul Sand"), (89, "Glowstone"), (90, "Nether Portal"),
    (91, "Jack O'Lantern"), (92, "Cake Block"), (93, "Redstone Repeater Block Off"),
    (94, "Redstone Repeater Block On"), (95, "White Stained Glass"), (96, "Wooden Trapdoor"),
    (97, "Stone Monster Egg"), (98, "Stone Bricks"), (99, "Brown Mushroom Block"),
    (100, "Red Mushroom Block"), (101, "Iron Bars"), (102, "Glass Pane"), (103, "Melon Block"),
    (104, "Pumpkin Stem"), (105, "Melon Stem"), (106, "Vines"), (107, "Oak Fence Gate"),
    (108, "Brick Stairs"), (109, "Stone Brick Stairs"), (110, "Mycelium"), (111, "Lily Pad"),
    (112, "Nether Brick"), (113, "Nether Brick Fence"), (114, "Nether Brick Stairs"),
    (115, "Nether Wart"), (116, "Enchantment Table"), (117, "Brewing Stand"),
    (118, "Cauldron"), (119, "End Portal"), (120, "End Portal Frame"), (121, "End Stone"),
    (122, "Dragon Egg"), (123, "Redstone Lamp Inactive"), (124, "Redstone Lamp Active"),
    (125, "Double Oak Wood Slab"), (126, "Oak Wood Slab"), (127, "Cocoa"),
    (128, "Sandstone Stairs"), (129, "Emerald Ore"), (130, "Ender Chest"),
    (131, "Tripwire Hook"), (132, "Tripwire"), (133, "Emerald Block"),
    (134, "Spruce Wood Stairs"), (135, "Birch Wood Stairs"), (136, "Jungle Wood Stairs"),
    (137, "Command Block"), (138, "Beacon"), (139, "Cobblestone Wall"), (140, "Flower Pot"),
    (141, "Carrots"), (142, "Potatoes"), (143, "Wooden Button"), (144, "Mob Head"),
    (145, "Anvil"), (146, "Trapped Chest"), (147, "Weighted Pressure Plate Light"),
    (148, "Weighted Pressure Plate Heavy"), (149, "Redstone Comparator Inactive"),
    (150, "Redstone Comparator Active"), (151, "Daylight Sensor"), (152, "Redstone Block"),
    (153, "Nether Quartz Ore"), (154, "Hopper"), (155, "Quartz Block"), (156, "Quartz Stairs"),
    (157, "Activator Rail"), (158, "Dropper"), (159, "White Hardened Clay"),
    (160, "White Stained Glass Pane"), (161, "Acacia Leaves"), (162, "Acacia Wood"),
    (163, "Acacia Wood Stairs"), (164, "Dark Oak Wood Stairs"), (165, "Slime Block"),
    (166, "Barrier"), (167, "Iron Trapdoor"), (168, "Prismarine"), (169, "Sea Lantern"),
    (170, "Hay Bale"), (171, "White Carpet"), (172, "Hardened Clay"), (173, "Block of Coal"),
    (174, "Packed Ice"), (175, "Sunflower"), (176, "Freestanding Banner"),
    (177, "Wallmounted Banner"), (178, "Inverted Daylight Sensor"), (179, "Red Sandstone"),
    (180, "Red Sandstone Stairs"), (181, "Double Red Sandstone Slab"),
    (182, "Red Sandstone Slab"), (183, "Spruce Fence Gate"), (184, "Birch Fence Gate"),
    (185, "Jungle Fence Gate"), (186, "Dark Oak Fence Gate"), (187, "Acacia Fence Gate"),
    (188, "Spruce Fence"), (189, "Birch Fence"), (190, "Jungle Fence"), (191, "Dark Oak Fence"),
    (192, "Acacia Fence"), (193, "Spruce Door Block"), (194, "Birch Door Block"),
    (195, "Jungle Door Block"), (196, "Acacia Door Block"), (197, "Dark Oak Door Block"),
    (198, "End Rod"), (199, "Chorus Plant"), (200, "Chorus Flower"), (201, "Purpur Block"),
    (202, "Purpur Pillar"), (203, "Purpur Stairs"), (204, "Purpur Double Slab"),
    (205, "Purpur Slab"), (206, "End Stone Bricks"), (207, "Beetroot Block"),
    (208, "Grass Path"), (209, "End Gateway"), (210, "Repeating Command Block"),
    (211, "Chain Command Block"), (212, "Frosted Ice"), (213, "Magma Block"),
    (214, "Nether Wart Block"), (215, "Red Nether Brick"), (216, "Bone Block"),
    (217, "Structure Void"), (218, "Observer"), (219, "White Shulker Box"),
    (220, "Orange Shulker Box"), (221, "Magenta Shulker Box"), (222, "Light Blue Shulker Box"),
    (223, "Yellow Shulker Box"), (224, "Lime Shulker Box"), (225, "Pink Shulker Box"),
    (226, "Gray Shulker Box"), (227, "Light Gray Shulker Box"), (228, "Cyan Shulker Box"),
    (229, "Purple Shulker Box"), (230, "Blue Shulker Box"), (231, "Brown Shulker Box"),
    (232, "Green Shulker Box"), (233, "Red Shulker Box"), (234, "Black Shulker Box"),
    (235, "White Glazed Terracotta"), (236, "Orange Glazed Terracotta"),
    (237, "Magenta Glazed Terracotta"), (238, "Light Blue Glazed Terracotta"),
    (239, "Yellow Glazed Terracotta"), (240, "Lime Glazed Terracotta"),
    (241, "Pink Glazed Terracotta"), (242, "Gray Glazed Terracotta"),
    (243, "Light Gray Glazed Terracotta"), (244, "Cyan Glazed Terracotta"),
    (245, "Purple Glazed Terracotta"), (246, "Blue Glazed Terracotta"),
    (247, "Brown Glazed Terracotta"), (248, "Green Glazed Terracotta"),
    (249, "Red Glazed Terracotta"), (250, "Black Glazed Terracotta"), (251, "White Concrete"),
    (252, "White Concrete Powder"), (255, "Structure Block"),
];

/// Human readable name for a block id, if the catalog knows it.
pub fn block_name(id: u8) -> Option<&'static str> {
    CATALOG
        .binary_search_by_key(&id, |(k, _)| *k)
        .ok()
        .map(|i| CATALOG[i].1)
}

/// `"<name> (<id>)"`, or `"block <id>"` for ids outside the catalog.
pub fn describe(id: u8) -> String {
    match block_name(id) {
        Some(name) => format!("{name} ({id})"),
        None => format!("block {id}"),
    }
}

/// The whole catalog as `id: name` lines.
pub fn catalog_text() -> String {
    CATALOG
        .iter()
        .map(|(id, name)| format!("{id}: {name}"))
        .collect::<Vec<_>>()
        .join("\n")
}
