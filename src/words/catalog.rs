//! Built-in word table used when no custom word list is configured.

pub(super) const CATEGORIES: &[(&str, &[&str])] = &[
    (
        "Animals",
        &[
            "dog", "cat", "elephant", "giraffe", "lion", "tiger", "bear", "wolf", "fox", "rabbit",
            "mouse", "whale", "dolphin", "shark", "crocodile", "snake", "eagle", "owl", "parrot",
            "penguin", "kangaroo", "koala", "panda", "monkey", "gorilla", "hippo", "rhino",
            "zebra", "horse", "cow", "pig", "sheep", "chicken", "duck", "squirrel", "hedgehog",
            "bat", "turtle", "chameleon", "frog", "butterfly", "bee", "ant", "spider", "scorpion",
            "crab", "octopus", "jellyfish",
        ],
    ),
    (
        "Food",
        &[
            "pizza", "hamburger", "pasta", "rice", "bread", "cheese", "milk", "yogurt", "butter",
            "egg", "chicken", "steak", "fish", "ham", "sausage", "bacon", "salad", "soup",
            "sandwich", "taco", "burrito", "sushi", "ramen", "curry", "paella", "omelette",
            "chocolate", "ice cream", "cake", "cookie", "donut", "apple", "orange", "banana",
            "strawberry", "grape", "watermelon", "pineapple", "mango", "pear", "peach", "cherry",
            "lemon", "avocado", "tomato", "lettuce", "carrot", "potato", "onion", "garlic",
            "cucumber",
        ],
    ),
    (
        "Objects",
        &[
            "table", "chair", "bed", "sofa", "lamp", "mirror", "clock", "telephone", "computer",
            "television", "radio", "camera", "book", "pencil", "pen", "notebook", "backpack",
            "suitcase", "umbrella", "glasses", "hat", "shoe", "shirt", "trousers", "dress",
            "jacket", "sock", "glove", "scarf", "necklace", "ring", "bracelet", "key", "padlock",
            "knife", "fork", "spoon", "plate", "glass", "mug", "bottle", "pot", "frying pan",
            "fridge", "stove", "washing machine", "vacuum cleaner", "hammer", "screwdriver",
        ],
    ),
    (
        "Professions",
        &[
            "doctor", "nurse", "dentist", "vet", "teacher", "professor", "engineer", "architect",
            "lawyer", "judge", "police officer", "firefighter", "soldier", "pilot", "sailor",
            "chef", "waiter", "barista", "carpenter", "plumber", "electrician", "mechanic",
            "painter", "gardener", "farmer", "fisherman", "miner", "artist", "musician", "singer",
            "actor", "dancer", "writer", "journalist", "photographer", "designer", "programmer",
            "scientist", "biologist", "chemist", "physicist", "astronomer", "athlete", "coach",
            "referee", "accountant", "banker",
        ],
    ),
    (
        "Places",
        &[
            "house", "apartment", "school", "university", "hospital", "pharmacy", "supermarket",
            "shop", "restaurant", "cafe", "bar", "hotel", "airport", "train station", "museum",
            "theatre", "cinema", "park", "beach", "mountain", "forest", "desert", "river", "lake",
            "ocean", "island", "city", "village", "church", "temple", "library", "bank", "office",
            "factory", "warehouse", "market", "square", "stadium", "gym", "swimming pool", "zoo",
            "aquarium", "circus", "castle", "bridge", "tower",
        ],
    ),
    (
        "Sports",
        &[
            "football", "basketball", "volleyball", "tennis", "baseball", "golf", "rugby",
            "hockey", "cricket", "swimming", "athletics", "gymnastics", "boxing", "wrestling",
            "judo", "karate", "taekwondo", "fencing", "cycling", "motocross", "skiing",
            "snowboarding", "surfing", "diving", "sailing", "rowing", "climbing", "skydiving",
            "horse riding", "polo", "bowling", "billiards", "darts", "archery", "skating",
            "skateboarding", "parkour",
        ],
    ),
    (
        "Transport",
        &[
            "car", "truck", "bus", "motorcycle", "bicycle", "train", "subway", "tram", "plane",
            "helicopter", "boat", "yacht", "submarine", "ferry", "canoe", "kayak", "sailboat",
            "cruise ship", "rocket", "spaceship", "hot air balloon", "cable car", "scooter",
            "roller skates", "sled", "wagon", "carriage", "ambulance", "taxi", "limousine",
        ],
    ),
    (
        "Nature",
        &[
            "tree", "flower", "rose", "tulip", "sunflower", "daisy", "orchid", "grass", "bush",
            "cactus", "palm tree", "pine", "oak", "willow", "cloud", "rain", "snow", "hail",
            "thunder", "lightning", "wind", "hurricane", "tornado", "earthquake", "volcano",
            "avalanche", "flood", "drought", "eclipse", "rainbow", "aurora", "star", "moon", "sun",
            "planet", "comet", "meteor", "galaxy", "nebula", "hill", "valley", "canyon", "cave",
            "cliff", "waterfall",
        ],
    ),
    (
        "Technology",
        &[
            "smartphone", "tablet", "laptop", "monitor", "keyboard", "printer", "scanner",
            "router", "modem", "hard drive", "memory", "processor", "cable", "charger", "battery",
            "headphones", "speaker", "microphone", "webcam", "projector", "console", "video game",
            "drone", "robot", "bluetooth", "wifi", "internet", "email", "app", "software",
            "hardware", "server", "algorithm", "code",
        ],
    ),
    (
        "Emotions",
        &[
            "happiness", "joy", "sadness", "anger", "fear", "surprise", "disgust", "love", "hate",
            "shame", "guilt", "pride", "jealousy", "envy", "gratitude", "hope", "anxiety",
            "nervousness", "calm", "peace", "euphoria", "melancholy", "nostalgia", "boredom",
            "frustration", "confusion", "curiosity", "admiration", "contempt", "compassion",
        ],
    ),
];
